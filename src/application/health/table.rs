//! Service health table

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use tracing::{debug, info};

use crate::domain::{HubError, HubResult, ServiceEntry, ServiceStatus, ServiceTableSnapshot};

/// Last-known status of each statically configured backend service.
///
/// The key set is fixed at construction: updates only ever change the status
/// of an existing entry.
///
/// Each entry also carries a check round, bumped by [`begin_check`]. A probe
/// result is applied through [`finish_check`] only while its round is still
/// the latest, so an overlapping slower probe cannot overwrite a newer result.
///
/// [`begin_check`]: ServiceHealthTable::begin_check
/// [`finish_check`]: ServiceHealthTable::finish_check
pub struct ServiceHealthTable {
    entries: DashMap<String, Slot>,
}

struct Slot {
    entry: ServiceEntry,
    round: u64,
}

pub type SharedServiceHealthTable = Arc<ServiceHealthTable>;

impl ServiceHealthTable {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = DashMap::new();
        for name in names {
            let name = name.into();
            entries.insert(
                name.clone(),
                Slot {
                    entry: ServiceEntry::new(name),
                    round: 0,
                },
            );
        }
        Self { entries }
    }

    /// Update one service's status. Fails with `UnknownService` for a name
    /// that was not configured; the table is left unchanged.
    pub fn set_status(&self, name: &str, status: ServiceStatus) -> HubResult<()> {
        let mut slot = self.slot_mut(name)?;
        let previous = slot.apply(status);
        drop(slot);

        log_transition(name, previous, status);
        Ok(())
    }

    /// Mark a service `checking` and open a new check round. Returns the
    /// round the probe must report back with.
    pub fn begin_check(&self, name: &str) -> HubResult<u64> {
        let mut slot = self.slot_mut(name)?;
        slot.round += 1;
        let round = slot.round;
        let previous = slot.apply(ServiceStatus::Checking);
        drop(slot);

        log_transition(name, previous, ServiceStatus::Checking);
        Ok(round)
    }

    /// Apply a probe result if `round` is still the latest for the service.
    /// Returns `false` when a newer round superseded it; the table is left
    /// unchanged.
    pub fn finish_check(&self, name: &str, round: u64, status: ServiceStatus) -> HubResult<bool> {
        let mut slot = self.slot_mut(name)?;
        if slot.round != round {
            let latest = slot.round;
            drop(slot);
            debug!(service = name, round, latest, %status, "Discarding superseded probe result");
            return Ok(false);
        }
        let previous = slot.apply(status);
        drop(slot);

        log_transition(name, previous, status);
        Ok(true)
    }

    fn slot_mut(&self, name: &str) -> HubResult<RefMut<'_, String, Slot>> {
        self.entries
            .get_mut(name)
            .ok_or_else(|| HubError::UnknownService(name.to_string()))
    }

    pub fn status(&self, name: &str) -> Option<ServiceStatus> {
        self.entries.get(name).map(|s| s.entry.status)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// Detached copy of the full table
    pub fn snapshot(&self) -> ServiceTableSnapshot {
        let entries: BTreeMap<String, ServiceEntry> = self
            .entries
            .iter()
            .map(|r| (r.key().clone(), r.value().entry.clone()))
            .collect();
        ServiceTableSnapshot::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Slot {
    /// Set the status, stamping terminal ones. Returns the previous status.
    fn apply(&mut self, status: ServiceStatus) -> ServiceStatus {
        let previous = self.entry.status;
        self.entry.status = status;
        if status.is_terminal() {
            self.entry.last_checked = Some(Utc::now());
        }
        previous
    }
}

fn log_transition(name: &str, previous: ServiceStatus, status: ServiceStatus) {
    if previous != status {
        info!(service = name, from = %previous, to = %status, "Service status changed");
    } else {
        debug!(service = name, %status, "Service status unchanged");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_table_is_all_unknown() {
        let table = ServiceHealthTable::new(["a", "b", "c"]);
        let snapshot = table.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.entries().all(|e| e.status == ServiceStatus::Unknown));
    }

    #[test]
    fn set_status_updates_entry_and_stamps_terminal_states() {
        let table = ServiceHealthTable::new(["a"]);

        table.set_status("a", ServiceStatus::Checking).unwrap();
        let snapshot = table.snapshot();
        assert_eq!(snapshot.status_of("a"), Some(ServiceStatus::Checking));
        assert!(snapshot.get("a").unwrap().last_checked.is_none());

        table.set_status("a", ServiceStatus::Running).unwrap();
        let snapshot = table.snapshot();
        assert_eq!(snapshot.status_of("a"), Some(ServiceStatus::Running));
        assert!(snapshot.get("a").unwrap().last_checked.is_some());
    }

    #[test]
    fn set_status_unknown_service_fails_and_leaves_table_unchanged() {
        let table = ServiceHealthTable::new(["a"]);
        let before = table.snapshot();

        let err = table.set_status("ghost", ServiceStatus::Running).unwrap_err();

        assert_eq!(err, HubError::UnknownService("ghost".into()));
        assert_eq!(table.snapshot(), before);
        assert!(!table.contains("ghost"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn snapshot_is_detached_from_table() {
        let table = ServiceHealthTable::new(["a"]);
        let snapshot = table.snapshot();
        table.set_status("a", ServiceStatus::Error).unwrap();
        assert_eq!(snapshot.status_of("a"), Some(ServiceStatus::Unknown));
        assert_eq!(table.status("a"), Some(ServiceStatus::Error));
    }

    #[test]
    fn names_are_sorted() {
        let table = ServiceHealthTable::new(["zeta", "alpha", "mid"]);
        assert_eq!(table.names(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn superseded_round_is_discarded() {
        let table = ServiceHealthTable::new(["a"]);
        let first = table.begin_check("a").unwrap();
        let second = table.begin_check("a").unwrap();
        assert!(second > first);

        assert!(table.finish_check("a", second, ServiceStatus::Missing).unwrap());
        assert!(!table.finish_check("a", first, ServiceStatus::Running).unwrap());
        assert_eq!(table.status("a"), Some(ServiceStatus::Missing));
    }

    #[test]
    fn round_bookkeeping_rejects_unknown_service() {
        let table = ServiceHealthTable::new(["a"]);
        assert!(table.begin_check("ghost").is_err());
        assert!(table.finish_check("ghost", 1, ServiceStatus::Running).is_err());
    }
}
