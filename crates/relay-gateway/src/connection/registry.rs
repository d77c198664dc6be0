//! Connection registry
//!
//! The set of live subscriber connections. Membership changes only through
//! this type, and its lock is never held across an `.await`.

use super::{Connection, ConnectionId};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Live connections keyed by id
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<BTreeMap<ConnectionId, Arc<Connection>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Add a connection
    ///
    /// Returns `false` if a connection with the same id is already listed.
    pub fn insert(&self, connection: Arc<Connection>) -> bool {
        let id = connection.id();
        let mut connections = self.connections.write();
        if connections.contains_key(&id) {
            return false;
        }
        connections.insert(id, connection);
        drop(connections);

        tracing::debug!(connection_id = %id, "Connection registered");
        true
    }

    /// Remove a connection by id
    pub fn remove(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        let removed = self.connections.write().remove(&id);
        if removed.is_some() {
            tracing::debug!(connection_id = %id, "Connection removed");
        }
        removed
    }

    /// Copy the current membership
    ///
    /// The returned list is detached from the registry, so callers may await
    /// while iterating it.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections.read().values().cloned().collect()
    }

    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.read().contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.len())
            .finish()
    }
}
