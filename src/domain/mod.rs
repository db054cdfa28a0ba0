//! Core hub types: service status, snapshots, connection identity, errors

pub mod error;
pub mod service;
pub mod snapshot;

use std::fmt;

use serde::Serialize;

pub use error::{HubError, HubResult};
pub use service::{ServiceEntry, ServiceStatus};
pub use snapshot::{MetricsSnapshot, ServiceMap, ServiceTableSnapshot};

/// Identity assigned to a realtime connection when it is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
