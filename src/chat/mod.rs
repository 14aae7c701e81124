pub mod manager;

pub use manager::{ChatManager, ChatStats};
