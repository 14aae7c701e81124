use std::collections::HashMap;

use crate::common::{ConnectionId, User};
use crate::network::Outbound;

/// A live connection bound to its registered user
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub outbound: Outbound,
}

/// Registered users, keyed both by user id and by connection
#[derive(Debug, Default)]
pub struct SessionRegistry {
    users: HashMap<String, User>,
    sessions: HashMap<ConnectionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a user and bind it to `connection`.
    ///
    /// Re-registering the same connection replaces its previous session.
    pub fn register(
        &mut self,
        connection: ConnectionId,
        id: &str,
        name: &str,
        outbound: Outbound,
    ) -> User {
        let user = User {
            id: id.to_string(),
            name: name.to_string(),
        };

        if let Some(previous) = self.sessions.remove(&connection) {
            self.users.remove(&previous.user.id);
        }

        self.users.insert(user.id.clone(), user.clone());
        self.sessions.insert(
            connection,
            Session {
                user: user.clone(),
                outbound,
            },
        );
        user
    }

    /// Remove the session for `connection`. Absent connections are a no-op.
    pub fn deregister(&mut self, connection: &ConnectionId) -> Option<User> {
        let session = self.sessions.remove(connection)?;
        self.users.remove(&session.user.id);
        Some(session.user)
    }

    pub fn all_connections(&self) -> impl Iterator<Item = (&ConnectionId, &Session)> {
        self.sessions.iter()
    }

    #[cfg(test)]
    pub fn get(&self, connection: &ConnectionId) -> Option<&User> {
        self.sessions.get(connection).map(|session| &session.user)
    }

    #[cfg(test)]
    pub fn user_by_id(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
