//! Realtime client connection handle

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::domain::{ConnectionId, HubError, HubResult};

/// Registry-side handle to one open WebSocket client.
///
/// The socket itself is owned by its transport task; the registry only holds
/// the sending half of the channel that task drains. Dropping the handle
/// closes the channel, which makes the transport task close the socket.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    sender: mpsc::UnboundedSender<String>,
    /// When the connection was accepted
    pub connected_at: DateTime<Utc>,
    /// Last inbound message
    pub last_activity: DateTime<Utc>,
}

impl Connection {
    pub fn new(id: ConnectionId, sender: mpsc::UnboundedSender<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            sender,
            connected_at: now,
            last_activity: now,
        }
    }

    /// Queue a message for the transport task
    pub fn send(&self, message: String) -> HubResult<()> {
        self.sender.send(message).map_err(|e| HubError::SendFailure {
            connection_id: self.id,
            reason: e.to_string(),
        })
    }

    /// Whether the transport task is still draining this connection
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}
