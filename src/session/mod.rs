pub mod manager;
pub(crate) mod password;
pub mod types;

pub use manager::{PersistStatus, SessionError, SessionManager};
pub use types::{Credential, Reminder, Settings, SignupRequest, UserProfile};
