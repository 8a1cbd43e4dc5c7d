use crate::signaling::ConnectionId;
use std::collections::HashMap;
use tether_core::{PresenceEntry, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: UserId,
    pub display_name: String,
    pub connection: ConnectionId,
}

/// What a `register` call displaced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Registration {
    /// The connection that held this id before the rebind.
    pub rebound_from: Option<ConnectionId>,
    /// The id this connection was bound to before, if it differs from the new one.
    pub released: Option<UserId>,
}

/// Two-way index between user ids and signaling connections.
///
/// At most one identity per id and at most one id per connection.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    users: HashMap<UserId, UserIdentity>,
    connections: HashMap<ConnectionId, UserId>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `id` to `connection`. The most recent registration wins.
    pub fn register(
        &mut self,
        id: UserId,
        display_name: String,
        connection: ConnectionId,
    ) -> Registration {
        let released = match self.connections.get(&connection) {
            Some(previous) if *previous != id => {
                let previous = previous.clone();
                self.users.remove(&previous);
                Some(previous)
            }
            _ => None,
        };

        let rebound_from = self
            .users
            .get(&id)
            .map(|identity| identity.connection)
            .filter(|old| *old != connection);
        if let Some(old) = rebound_from {
            self.connections.remove(&old);
        }

        self.connections.insert(connection, id.clone());
        self.users.insert(
            id.clone(),
            UserIdentity {
                id,
                display_name,
                connection,
            },
        );

        Registration {
            rebound_from,
            released,
        }
    }

    /// Removes whatever id is bound to `connection`. Unknown connections are a no-op.
    pub fn unregister(&mut self, connection: &ConnectionId) -> Option<UserId> {
        let id = self.connections.remove(connection)?;
        self.users.remove(&id);
        Some(id)
    }

    pub fn resolve(&self, id: &UserId) -> Option<ConnectionId> {
        self.users.get(id).map(|identity| identity.connection)
    }

    pub fn identity_of(&self, connection: &ConnectionId) -> Option<&UserIdentity> {
        self.connections
            .get(connection)
            .and_then(|id| self.users.get(id))
    }

    /// Current membership, sorted by id.
    pub fn snapshot(&self) -> Vec<PresenceEntry> {
        let mut entries: Vec<PresenceEntry> = self
            .users
            .values()
            .map(|identity| PresenceEntry {
                id: identity.id.clone(),
                name: identity.display_name.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
