//! In-memory chat state. Nothing here is persisted across restarts.

pub mod message_log;
pub mod session_registry;

pub use message_log::{MessageLog, SearchField};
pub use session_registry::{Session, SessionRegistry};
