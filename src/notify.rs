//! Delivery contract for scheduled reminders.
//!
//! The session core only stores [`Reminder`] records; whoever renders the
//! reminders screen wires a [`Notifier`] to them. The shipping
//! implementation degrades to structured logging, the same way the original
//! app no-ops where platform notifications are unavailable.

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::session::Reminder;

/// Schedules a user-visible notification for a point in time and returns a
/// delivery handle. Implementations decide what delivery means.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn schedule(
        &self,
        title: &str,
        body: &str,
        fire_at: OffsetDateTime,
    ) -> anyhow::Result<String>;
}

/// Notifier that records the request in the log and delivers nothing.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn schedule(
        &self,
        title: &str,
        body: &str,
        fire_at: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let handle = Uuid::new_v4().to_string();
        info!(%handle, title, body, fire_at = %fire_at, "notification scheduled (log only)");
        Ok(handle)
    }
}

/// Computes when a stored reminder should fire, treating its date and time
/// as UTC.
pub fn reminder_fire_time(reminder: &Reminder) -> anyhow::Result<OffsetDateTime> {
    let date = reminder.parse_date()?;
    let time = reminder.parse_time()?;
    Ok(date.with_time(time).assume_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fire_time_combines_date_and_time_as_utc() {
        let reminder = Reminder::new("2024-05-20", "06:45");
        let at = reminder_fire_time(&reminder).expect("should parse");
        assert_eq!(at.year(), 2024);
        assert_eq!(u8::from(at.month()), 5);
        assert_eq!(at.day(), 20);
        assert_eq!((at.hour(), at.minute()), (6, 45));
        assert_eq!(at.offset(), time::UtcOffset::UTC);
    }

    #[test]
    fn fire_time_rejects_malformed_input() {
        let reminder = Reminder {
            id: "bad".into(),
            date: "soon".into(),
            time: "later".into(),
        };
        assert!(reminder_fire_time(&reminder).is_err());
    }

    #[tokio::test]
    async fn log_notifier_hands_back_a_unique_handle() {
        let notifier = LogNotifier;
        let at = reminder_fire_time(&Reminder::new("2024-05-20", "06:45")).unwrap();
        let a = notifier.schedule("Time to meditate", "Mindful Breathing", at).await.unwrap();
        let b = notifier.schedule("Time to meditate", "Body Scan", at).await.unwrap();
        assert_ne!(a, b);
    }
}
