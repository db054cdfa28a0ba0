//! Concurrent startup probing

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::probe::{run_probe, MonitoredService};
use super::table::SharedServiceHealthTable;

/// Launches one independent task per monitored service. Each task reports
/// exactly one terminal status to the table, which keeps it only if no later
/// launch has started a newer round for that service.
#[derive(Debug, Clone)]
pub struct ProbeRunner {
    timeout: Duration,
}

impl ProbeRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn launch(&self, table: &SharedServiceHealthTable, services: &[MonitoredService]) -> ProbeSet {
        info!(count = services.len(), "🔍 Checking service availability...");

        let mut tasks = Vec::with_capacity(services.len());
        for service in services {
            let round = match table.begin_check(&service.name) {
                Ok(round) => round,
                Err(e) => {
                    error!(service = %service.name, error = %e, "Probe configured for a service the table does not know");
                    continue;
                }
            };

            // Weak so a straggling probe never keeps a torn-down table alive
            let table = Arc::downgrade(table);
            let name = service.name.clone();
            let probe = service.probe.clone();
            let timeout = self.timeout;

            tasks.push(tokio::spawn(async move {
                let status = run_probe(&name, probe, timeout).await;
                match table.upgrade() {
                    Some(table) => {
                        if let Err(e) = table.finish_check(&name, round, status) {
                            error!(service = %name, error = %e, "Failed to record probe result");
                        }
                    }
                    None => debug!(service = %name, %status, "Table dropped, discarding late probe result"),
                }
            }));
        }

        ProbeSet { tasks }
    }
}

/// Handles to in-flight probe tasks. Dropping the set detaches the tasks;
/// they still run to completion.
#[derive(Debug)]
pub struct ProbeSet {
    tasks: Vec<JoinHandle<()>>,
}

impl ProbeSet {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Resolve once every probe has applied its terminal status
    pub async fn wait(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Probe supervisor task failed");
            }
        }
    }
}
