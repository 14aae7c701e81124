pub mod handler;
pub mod outbound;
pub mod server;

pub use handler::ConnectionHandler;
pub use outbound::{Outbound, OutboundReceiver, run_writer};
pub use server::ChatServer;
