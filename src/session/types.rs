use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, Time};

/// The authenticated identity. At most one lives in memory at a time;
/// `None` means signed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// One entry in the credential table, keyed by email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub profile: UserProfile,
    #[serde(rename = "password")]
    pub password_hash: String, // Argon2 hash, never the plaintext
}

/// Everything signup needs; the profile is built from it on success.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl SignupRequest {
    pub fn into_profile(self) -> UserProfile {
        UserProfile {
            name: self.name,
            username: self.username,
            email: self.email,
            age: self.age,
            country: self.country,
        }
    }
}

/// A scheduled reminder. `date` is `YYYY-MM-DD`, `time` is `HH:mm`; both are
/// kept as strings in storage and parsed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub date: String,
    pub time: String,
}

impl Reminder {
    /// Builds a reminder with the composite `date_time` id, so re-adding the
    /// same slot is naturally a no-op.
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        let date = date.into();
        let time = time.into();
        Self {
            id: format!("{date}_{time}"),
            date,
            time,
        }
    }

    pub fn parse_date(&self) -> anyhow::Result<Date> {
        let format = format_description!("[year]-[month]-[day]");
        Date::parse(&self.date, &format)
            .map_err(|e| anyhow::anyhow!("bad reminder date {:?}: {e}", self.date))
    }

    pub fn parse_time(&self) -> anyhow::Result<Time> {
        let format = format_description!("[hour]:[minute]");
        Time::parse(&self.time, &format)
            .map_err(|e| anyhow::anyhow!("bad reminder time {:?}: {e}", self.time))
    }
}

/// Well-known settings flags. The record itself is open: any flag name can
/// be toggled, these are just the ones the app ships with.
pub const DARK_MODE: &str = "dark-mode";
pub const NOTIFICATIONS: &str = "notifications";

/// Open record of boolean settings flags. Absent flags read as off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    flags: BTreeMap<String, bool>,
}

impl Settings {
    pub fn is_enabled(&self, flag: &str) -> bool {
        self.flags.get(flag).copied().unwrap_or(false)
    }

    /// Flips the named flag: absent reads as off, so the first toggle turns
    /// it on. Returns the new value.
    pub fn toggle(&mut self, flag: &str) -> bool {
        let entry = self.flags.entry(flag.to_string()).or_insert(false);
        *entry = !*entry;
        *entry
    }
}
