pub mod commands;
pub mod types;

pub use commands::ClientCommand;
pub use types::{ConnectionId, Message, User};
