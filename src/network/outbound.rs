use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::error::{ChatError, Result};

pub type OutboundReceiver = mpsc::UnboundedReceiver<String>;

/// Kênh ghi ra của một kết nối.
///
/// Mọi dữ liệu gửi cho client đều đi qua kênh này nên thứ tự nhận
/// trùng với thứ tự enqueue. Gửi không bao giờ block.
#[derive(Debug, Clone)]
pub struct Outbound {
    sender: mpsc::UnboundedSender<String>,
}

impl Outbound {
    pub fn channel() -> (Self, OutboundReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Gửi nguyên văn, không thêm xuống dòng (dùng cho prompt).
    pub fn send_raw(&self, text: &str) -> Result<()> {
        self.sender
            .send(text.to_string())
            .map_err(|_| ChatError::ConnectionClosed)
    }

    pub fn send_line(&self, line: &str) -> Result<()> {
        self.sender
            .send(format!("{line}\n"))
            .map_err(|_| ChatError::ConnectionClosed)
    }
}

/// Drain `receiver` into `writer` until every `Outbound` handle is dropped,
/// then shut the write side down.
pub async fn run_writer<W>(mut receiver: OutboundReceiver, mut writer: W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(chunk) = receiver.recv().await {
        writer.write_all(chunk.as_bytes()).await?;
        writer.flush().await?;
    }
    writer.shutdown().await
}
