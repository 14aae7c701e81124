use std::fmt;

use chrono::Local;
use uuid::Uuid;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Khóa định danh một kết nối đang sống.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Người dùng đã đăng ký. `id` lấy từ địa chỉ remote của kết nối.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
}

/// Domain model đại diện một tin nhắn chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: String,
    pub content: String,
    pub timestamp: String,
}

impl Message {
    /// Tạo tin nhắn với timestamp giờ địa phương hiện tại.
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_timestamp(
            sender,
            content,
            Local::now().format(TIMESTAMP_FORMAT).to_string(),
        )
    }

    pub fn with_timestamp(
        sender: impl Into<String>,
        content: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn joined(user: &User) -> Self {
        Self::new(user.name.clone(), format!("{} has joined.", user.name))
    }

    pub fn left(user: &User) -> Self {
        Self::new(user.name.clone(), format!("{} has left.", user.name))
    }

    pub fn format_line(&self) -> String {
        format!("[{}] {}: {}", self.timestamp, self.sender, self.content)
    }
}
