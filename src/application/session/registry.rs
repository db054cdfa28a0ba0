//! Connection registry — the set of currently open realtime clients

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::{ConnectionId, HubError, HubResult};

use super::connection::Connection;

/// Outcome of one fan-out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub removed: Vec<ConnectionId>,
}

/// Thread-safe registry of open realtime connections.
///
/// Pure bookkeeping: a connection is present iff its transport is open.
/// Shard locks are only held for the map operation itself, never across an
/// await point.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Connection>,
    next_id: AtomicU64,
}

/// Shared, reference-counted connection registry
pub type SharedConnectionRegistry = Arc<ConnectionRegistry>;

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Wrap in `Arc` for shared ownership
    pub fn shared() -> SharedConnectionRegistry {
        Arc::new(Self::new())
    }

    /// Reserve the identity for a connection being accepted
    pub fn allocate_id(&self) -> ConnectionId {
        ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a newly accepted connection under a reserved identity
    pub fn insert(&self, id: ConnectionId, sender: mpsc::UnboundedSender<String>) {
        self.connections.insert(id, Connection::new(id, sender));
        ::metrics::gauge!("hub_active_connections").set(self.connections.len() as f64);
        info!(connection_id = %id, total = self.connections.len(), "Connection registered");
    }

    /// Register a newly accepted connection and assign its identity
    pub fn add(&self, sender: mpsc::UnboundedSender<String>) -> ConnectionId {
        let id = self.allocate_id();
        self.insert(id, sender);
        id
    }

    /// Unregister a connection. Removing an absent connection is a no-op;
    /// returns whether this call did the removal.
    pub fn remove(&self, id: ConnectionId) -> bool {
        if self.connections.remove(&id).is_some() {
            ::metrics::gauge!("hub_active_connections").set(self.connections.len() as f64);
            info!(connection_id = %id, total = self.connections.len(), "Connection removed");
            true
        } else {
            debug!(connection_id = %id, "Connection already removed");
            false
        }
    }

    /// Send to one connection. A failed send removes it.
    pub fn send_to(&self, id: ConnectionId, message: String) -> HubResult<()> {
        let conn = match self.connections.get(&id) {
            Some(conn) => conn.clone(),
            None => {
                return Err(HubError::SendFailure {
                    connection_id: id,
                    reason: "not registered".to_string(),
                })
            }
        };

        conn.send(message).inspect_err(|e| {
            warn!(connection_id = %id, error = %e, "Send failed, dropping connection");
            self.remove(id);
        })
    }

    /// Send `message` to every registered connection.
    ///
    /// Iterates over a copy of the current set; connections whose send fails
    /// are removed after the fan-out completes. Never fails as a whole.
    pub fn broadcast(&self, message: &str) -> BroadcastReport {
        let targets: Vec<Connection> = self.connections.iter().map(|r| r.value().clone()).collect();

        let mut report = BroadcastReport::default();
        for conn in &targets {
            match conn.send(message.to_string()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(connection_id = %conn.id, error = %e, "Broadcast send failed");
                    report.removed.push(conn.id);
                }
            }
        }

        for id in &report.removed {
            self.remove(*id);
        }

        report
    }

    /// Record inbound activity on a connection
    pub fn touch(&self, id: ConnectionId) {
        if let Some(mut conn) = self.connections.get_mut(&id) {
            conn.touch();
        }
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.iter().map(|r| *r.key()).collect()
    }

    /// Unregister every connection, closing their transports. Returns how
    /// many were closed.
    pub fn close_all(&self) -> usize {
        let ids = self.ids();
        ids.into_iter().filter(|id| self.remove(*id)).count()
    }

    /// Number of open connections. For reporting only.
    pub fn size(&self) -> usize {
        self.connections.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
