//! Fresh metrics snapshots from the service table and connection registry

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::Utc;

use crate::application::health::SharedServiceHealthTable;
use crate::application::session::SharedConnectionRegistry;
use crate::domain::MetricsSnapshot;

/// Assembles a [`MetricsSnapshot`] on demand. Nothing is cached; every call
/// reads the current table and registry and takes the next sequence number.
pub struct MetricsCollector {
    table: SharedServiceHealthTable,
    registry: SharedConnectionRegistry,
    started_at: Instant,
    sequence: AtomicU64,
}

impl MetricsCollector {
    pub fn new(table: SharedServiceHealthTable, registry: SharedConnectionRegistry) -> Self {
        Self {
            table,
            registry,
            started_at: Instant::now(),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn collect(&self) -> MetricsSnapshot {
        self.collect_with_connections(self.registry.size())
    }

    /// Snapshot reporting `active_connections` instead of the registry size.
    /// Used for the welcome push, which is built before the new connection
    /// is registered.
    pub fn collect_with_connections(&self, active_connections: usize) -> MetricsSnapshot {
        let uptime = self.started_at.elapsed();
        MetricsSnapshot {
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed) + 1,
            uptime_secs: uptime.as_secs(),
            uptime_ms: uptime.as_millis() as u64,
            active_connections,
            services: self.table.snapshot(),
            timestamp: Utc::now(),
        }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}
