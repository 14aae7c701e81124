use parking_lot::Mutex;

use crate::common::{ConnectionId, Message, User};
use crate::network::Outbound;
use crate::storage::{MessageLog, SearchField, SessionRegistry};

#[derive(Debug, Default)]
struct ChatState {
    log: MessageLog,
    registry: SessionRegistry,
}

/// Snapshot of the shared state sizes, for periodic logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatStats {
    pub sessions: usize,
    pub messages: usize,
}

/// Owns the message log and session registry behind one lock.
///
/// Every operation takes the lock for its whole duration and never awaits
/// while holding it, so operations are linearizable with respect to each
/// other. Broadcast only enqueues onto per-connection channels.
#[derive(Debug, Default)]
pub struct ChatManager {
    state: Mutex<ChatState>,
}

impl ChatManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_message(&self, message: Message) {
        self.state.lock().log.append(message);
    }

    /// Formatted matches in append order, taken under the lock.
    pub fn search_messages(&self, query: &str, field: SearchField) -> Vec<String> {
        self.state.lock().log.search(query, field)
    }

    pub fn register_user(
        &self,
        id: &str,
        name: &str,
        connection: ConnectionId,
        outbound: Outbound,
    ) -> User {
        let user = self
            .state
            .lock()
            .registry
            .register(connection, id, name, outbound);
        log::debug!("Registered {} ({}) on connection {connection}", user.name, user.id);
        user
    }

    /// No-op for connections that are not registered.
    pub fn remove_user(&self, connection: &ConnectionId) -> Option<User> {
        let removed = self.state.lock().registry.deregister(connection);
        if removed.is_none() {
            log::debug!("remove_user: connection {connection} was not registered");
        }
        removed
    }

    /// Enqueue the formatted line to every registered connection.
    ///
    /// Connections whose output is already closed are skipped. Returns how
    /// many connections accepted the line.
    pub fn broadcast_message(&self, message: &Message) -> usize {
        let line = message.format_line();
        let state = self.state.lock();
        let mut delivered = 0;

        for (connection, session) in state.registry.all_connections() {
            match session.outbound.send_line(&line) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    log::debug!(
                        "Skipping broadcast to {} on {connection}: {err}",
                        session.user.name
                    );
                }
            }
        }

        delivered
    }

    pub fn stats(&self) -> ChatStats {
        let state = self.state.lock();
        ChatStats {
            sessions: state.registry.len(),
            messages: state.log.len(),
        }
    }
}
