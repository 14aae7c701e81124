use std::net::AddrParseError;

use thiserror::Error;

/// Lỗi của server chat.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid listen address `{addr}`: {source}")]
    InvalidListenAddr {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    /// Writer task của kết nối đã dừng, không gửi thêm được nữa.
    #[error("Connection output closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, ChatError>;
