use std::future::{Future, pending};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Interval, interval};

use crate::chat::ChatManager;
use crate::error::{ChatError, Result};

use super::handler::ConnectionHandler;
use super::outbound::{Outbound, run_writer};

/// TCP listener: mỗi kết nối được phục vụ bởi một task riêng.
pub struct ChatServer {
    listener: TcpListener,
    manager: Arc<ChatManager>,
    stats_interval: Option<Duration>,
}

impl ChatServer {
    pub async fn bind(addr: &str, manager: Arc<ChatManager>) -> Result<Self> {
        let socket_addr: SocketAddr = addr.parse().map_err(|source| ChatError::InvalidListenAddr {
            addr: addr.to_string(),
            source,
        })?;
        let listener = TcpListener::bind(socket_addr).await?;
        log::info!("Server is listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            manager,
            stats_interval: None,
        })
    }

    /// Log session/message counts periodically. Zero disables it.
    pub fn with_stats_interval(mut self, secs: u64) -> Self {
        self.stats_interval = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) {
        self.run_until(pending::<()>()).await;
    }

    /// Accept connections until `shutdown` resolves. Accept errors are
    /// logged and never stop the loop.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future,
    {
        tokio::pin!(shutdown);
        let mut stats_ticker = self.stats_interval.map(interval);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((socket, addr)) => self.spawn_connection(socket, addr),
                        Err(err) => log::error!("Error accepting connection: {err}"),
                    }
                }
                _ = tick(&mut stats_ticker) => {
                    let stats = self.manager.stats();
                    log::info!(
                        "Statistics: {} connected users, {} stored messages",
                        stats.sessions,
                        stats.messages
                    );
                }
                _ = &mut shutdown => {
                    log::info!("Shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }
    }

    fn spawn_connection(&self, socket: TcpStream, addr: SocketAddr) {
        log::info!("Client connected: {addr}");
        let (read_half, write_half) = socket.into_split();
        let (outbound, receiver) = Outbound::channel();

        tokio::spawn(async move {
            if let Err(err) = run_writer(receiver, write_half).await {
                log::debug!("Writer for {addr} stopped: {err}");
            }
        });

        let handler = ConnectionHandler::new(
            Arc::clone(&self.manager),
            addr.to_string(),
            BufReader::new(read_half),
            outbound,
        );
        tokio::spawn(async move {
            handler.run().await;
            log::info!("Client disconnected: {addr}");
        });
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending::<()>().await,
    }
}
