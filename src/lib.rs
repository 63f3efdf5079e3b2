pub mod config;
pub mod countries;
pub mod notify;
pub mod session;
pub mod store;

pub use session::{PersistStatus, SessionError, SessionManager};
pub use store::{FileStore, KvStore, MemoryStore, StoreKey};
