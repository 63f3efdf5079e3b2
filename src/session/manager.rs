use std::collections::BTreeMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::session::password::{hash_password, verify_password};
use crate::session::types::{Credential, Reminder, Settings, SignupRequest, UserProfile};
use crate::store::{read_json, write_json, KvStore, StoreKey};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Failures reported to the caller as values. Nothing here is fatal; every
/// variant is something a UI shows and lets the user retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session not hydrated yet")]
    NotReady,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid email address")]
    InvalidEmail,
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    BadCredentials,
    #[error("password hashing failed: {0}")]
    Password(String),
}

/// Outcome of the write-through that trails every mutation. The in-memory
/// state is authoritative either way; `WriteFailed` only means the change
/// may not survive a restart.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStatus {
    /// Applied in memory and written to the store.
    Saved,
    /// Applied in memory; the trailing write was dropped.
    WriteFailed,
    /// The call was a no-op, nothing was written.
    Unchanged,
}

/// Authoritative in-memory session state over a [`KvStore`].
///
/// Lifecycle is explicit: construct with [`SessionManager::new`], then call
/// [`hydrate`](SessionManager::hydrate) once before mutating. Mutations
/// issued earlier fail fast with [`SessionError::NotReady`] rather than
/// racing the hydration reads. One manager instance owns the namespaced
/// keys per process; operations are sequential (`&mut self`), so no two
/// writes to the same key are ever in flight at once.
pub struct SessionManager {
    store: Arc<dyn KvStore>,
    hydrated: bool,
    user: Option<UserProfile>,
    users: BTreeMap<String, Credential>,
    favorites: Vec<String>,
    reminders: Vec<Reminder>,
    done: BTreeMap<String, bool>,
    settings: Settings,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            hydrated: false,
            user: None,
            users: BTreeMap::new(),
            favorites: Vec::new(),
            reminders: Vec::new(),
            done: BTreeMap::new(),
            settings: Settings::default(),
        }
    }

    /// Loads every slice from the store, falling back to defaults for
    /// anything absent or unreadable, and marks the session ready. Safe to
    /// call again; against unchanged storage the result is identical.
    pub async fn hydrate(&mut self) {
        let store = self.store.as_ref();
        self.user = read_json(store, StoreKey::CurrentUser, None).await;
        self.users = read_json(store, StoreKey::UsersTable, BTreeMap::new()).await;
        self.favorites = read_json(store, StoreKey::Favorites, Vec::new()).await;
        self.reminders = read_json(store, StoreKey::Reminders, Vec::new()).await;
        self.done = read_json(store, StoreKey::CompletionMap, BTreeMap::new()).await;
        self.settings = read_json(store, StoreKey::Settings, Settings::default()).await;
        self.hydrated = true;
        info!(
            registered = self.users.len(),
            favorites = self.favorites.len(),
            reminders = self.reminders.len(),
            signed_in = self.user.is_some(),
            "session hydrated"
        );
    }

    pub fn is_ready(&self) -> bool {
        self.hydrated
    }

    pub fn current_user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn favorites(&self) -> &[String] {
        &self.favorites
    }

    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn is_done(&self, id: &str) -> bool {
        self.done.get(id).copied().unwrap_or(false)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registered_users(&self) -> usize {
        self.users.len()
    }

    fn ensure_ready(&self) -> Result<(), SessionError> {
        if self.hydrated {
            Ok(())
        } else {
            Err(SessionError::NotReady)
        }
    }

    async fn persist<T: Serialize>(&self, key: StoreKey, value: &T) -> PersistStatus {
        match write_json(self.store.as_ref(), key, value).await {
            Ok(()) => PersistStatus::Saved,
            Err(e) => {
                warn!(key = key.name(), error = %e, "write-through failed, change is memory-only");
                PersistStatus::WriteFailed
            }
        }
    }

    /// Registers a new account. Does not sign the new user in; the UI sends
    /// them to the login flow, as the original app did.
    pub async fn signup(&mut self, mut req: SignupRequest) -> Result<PersistStatus, SessionError> {
        self.ensure_ready()?;
        req.email = req.email.trim().to_string();

        if req.name.trim().is_empty() {
            return Err(SessionError::MissingField("name"));
        }
        if req.username.trim().is_empty() {
            return Err(SessionError::MissingField("username"));
        }
        if req.email.is_empty() {
            return Err(SessionError::MissingField("email"));
        }
        if req.password.is_empty() {
            return Err(SessionError::MissingField("password"));
        }
        if !is_valid_email(&req.email) {
            warn!(email = %req.email, "invalid email");
            return Err(SessionError::InvalidEmail);
        }
        if self
            .users
            .keys()
            .any(|registered| registered.eq_ignore_ascii_case(&req.email))
        {
            warn!(email = %req.email, "email already registered");
            return Err(SessionError::EmailTaken);
        }

        let password_hash =
            hash_password(&req.password).map_err(|e| SessionError::Password(e.to_string()))?;
        let email = req.email.clone();
        self.users.insert(
            email.clone(),
            Credential {
                profile: req.into_profile(),
                password_hash,
            },
        );
        info!(email = %email, "user registered");
        Ok(self.persist(StoreKey::UsersTable, &self.users).await)
    }

    /// Signs in: case-insensitive email match, argon2 password check. The
    /// failure is uniform for unknown email and wrong password. On success
    /// the profile is copied out of the credential table and persisted as
    /// the current user.
    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<PersistStatus, SessionError> {
        self.ensure_ready()?;
        let email = email.trim();

        let profile = match self
            .users
            .iter()
            .find(|(registered, _)| registered.eq_ignore_ascii_case(email))
        {
            Some((_, cred)) => {
                let ok = match verify_password(password, &cred.password_hash) {
                    Ok(ok) => ok,
                    Err(e) => {
                        error!(email = %email, error = %e, "stored credential unreadable");
                        false
                    }
                };
                if !ok {
                    warn!(email = %email, "login password mismatch");
                    return Err(SessionError::BadCredentials);
                }
                cred.profile.clone()
            }
            None => {
                warn!(email = %email, "login unknown email");
                return Err(SessionError::BadCredentials);
            }
        };

        info!(username = %profile.username, "login ok");
        self.user = Some(profile);
        Ok(self.persist(StoreKey::CurrentUser, &self.user).await)
    }

    /// Clears the current user only; favorites, reminders, completion and
    /// settings stay untouched. Idempotent.
    pub async fn logout(&mut self) -> Result<PersistStatus, SessionError> {
        self.ensure_ready()?;
        if self.user.is_none() {
            return Ok(PersistStatus::Unchanged);
        }
        self.user = None;
        info!("logged out");
        Ok(self.persist(StoreKey::CurrentUser, &self.user).await)
    }

    /// Flips membership of a content id in the favorites set. Insertion
    /// order of the remaining ids is preserved.
    pub async fn toggle_favorite(&mut self, id: &str) -> Result<PersistStatus, SessionError> {
        self.ensure_ready()?;
        match self.favorites.iter().position(|fav| fav == id) {
            Some(pos) => {
                self.favorites.remove(pos);
            }
            None => self.favorites.push(id.to_string()),
        }
        Ok(self.persist(StoreKey::Favorites, &self.favorites).await)
    }

    /// Appends a reminder unless its id is already present; a duplicate id
    /// is a no-op and the first-inserted values win.
    pub async fn add_reminder(&mut self, reminder: Reminder) -> Result<PersistStatus, SessionError> {
        self.ensure_ready()?;
        if self.reminders.iter().any(|r| r.id == reminder.id) {
            return Ok(PersistStatus::Unchanged);
        }
        self.reminders.push(reminder);
        Ok(self.persist(StoreKey::Reminders, &self.reminders).await)
    }

    /// Flips the done flag for a content id; an absent entry counts as not
    /// done, so the first toggle marks it done.
    pub async fn toggle_done(&mut self, id: &str) -> Result<PersistStatus, SessionError> {
        self.ensure_ready()?;
        let flag = self.done.entry(id.to_string()).or_insert(false);
        *flag = !*flag;
        Ok(self.persist(StoreKey::CompletionMap, &self.done).await)
    }

    /// Flips a settings flag by name; unknown flags start off.
    pub async fn toggle_setting(&mut self, flag: &str) -> Result<PersistStatus, SessionError> {
        self.ensure_ready()?;
        let value = self.settings.toggle(flag);
        info!(flag, value, "setting toggled");
        Ok(self.persist(StoreKey::Settings, &self.settings).await)
    }
}
