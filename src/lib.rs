pub mod chat;
pub mod common;
pub mod config;
pub mod error;
pub mod network;
pub mod storage;

pub use chat::ChatManager;
pub use error::ChatError;
pub use network::ChatServer;
