//! Point-in-time copies of hub state handed to readers

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::{ServiceEntry, ServiceStatus};

/// Wire view of the service table: name → status
pub type ServiceMap = BTreeMap<String, ServiceStatus>;

/// Immutable copy of the whole service health table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceTableSnapshot {
    entries: BTreeMap<String, ServiceEntry>,
}

impl ServiceTableSnapshot {
    pub fn new(entries: BTreeMap<String, ServiceEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&ServiceEntry> {
        self.entries.get(name)
    }

    pub fn status_of(&self, name: &str) -> Option<ServiceStatus> {
        self.entries.get(name).map(|e| e.status)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ServiceEntry> {
        self.entries.values()
    }

    /// Name → status map used by every outbound payload
    pub fn statuses(&self) -> ServiceMap {
        self.entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.status))
            .collect()
    }

    /// Number of services currently `running`
    pub fn healthy(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.status == ServiceStatus::Running)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Consolidated status computed fresh for every broadcast tick, welcome push
/// or HTTP request. Never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub sequence: u64,
    pub uptime_secs: u64,
    pub uptime_ms: u64,
    pub active_connections: usize,
    pub services: ServiceTableSnapshot,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, status: ServiceStatus) -> (String, ServiceEntry) {
        let mut e = ServiceEntry::new(name);
        e.status = status;
        (name.to_string(), e)
    }

    #[test]
    fn statuses_and_healthy_count() {
        let snapshot = ServiceTableSnapshot::new(
            [
                entry("a", ServiceStatus::Running),
                entry("b", ServiceStatus::Missing),
                entry("c", ServiceStatus::Running),
            ]
            .into_iter()
            .collect(),
        );

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.healthy(), 2);
        assert_eq!(snapshot.status_of("b"), Some(ServiceStatus::Missing));
        assert_eq!(snapshot.status_of("z"), None);

        let map = snapshot.statuses();
        assert_eq!(
            serde_json::to_value(&map).unwrap(),
            serde_json::json!({"a": "running", "b": "missing", "c": "running"})
        );
    }
}
