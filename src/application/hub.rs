//! Status hub — composition root of the realtime status service
//!
//! Owns the service health table, the connection registry, the broadcast
//! scheduler and the command router, and wires connection lifecycle,
//! startup probing and shutdown together.
//!
//! Per-connection lifecycle is `OPENING → OPEN → CLOSED`: [`StatusHub::connect`]
//! pushes the welcome snapshot and registers the connection, and
//! [`StatusHub::disconnect`] removes it (idempotently, so close and error
//! paths may both call it).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::application::commands::{CommandRouter, OutboundMessage};
use crate::application::health::{
    MonitoredService, ProbeRunner, ProbeSet, ServiceHealthTable, SharedServiceHealthTable,
};
use crate::application::services::{BroadcastScheduler, MetricsCollector, SchedulerHandle};
use crate::application::session::{ConnectionRegistry, SharedConnectionRegistry};
use crate::config::{AppConfig, HubConfig};
use crate::domain::{
    ConnectionId, HubError, HubResult, MetricsSnapshot, ServiceStatus, ServiceTableSnapshot,
};

pub type SharedStatusHub = Arc<StatusHub>;

pub struct StatusHub {
    table: SharedServiceHealthTable,
    registry: SharedConnectionRegistry,
    collector: Arc<MetricsCollector>,
    router: CommandRouter,
    services: Vec<MonitoredService>,
    probe_runner: ProbeRunner,
    broadcast_interval: Duration,
    send_timeout: Duration,
    scheduler: Mutex<Option<SchedulerHandle>>,
    closed: AtomicBool,
}

impl StatusHub {
    pub fn new(config: &HubConfig, services: Vec<MonitoredService>) -> Self {
        let table = Arc::new(ServiceHealthTable::new(services.iter().map(|s| s.name.clone())));
        let registry = ConnectionRegistry::shared();
        let collector = Arc::new(MetricsCollector::new(table.clone(), registry.clone()));

        Self {
            table,
            registry,
            collector,
            router: CommandRouter::new(),
            services,
            probe_runner: ProbeRunner::new(config.probe_timeout()),
            broadcast_interval: config.broadcast_interval(),
            send_timeout: config.send_timeout(),
            scheduler: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Build the hub for the services listed in the application config
    pub fn from_config(config: &AppConfig) -> Self {
        let services = config
            .services
            .iter()
            .map(|s| MonitoredService::from_config(&s.name, &s.probe))
            .collect();
        Self::new(&config.hub, services)
    }

    pub fn shared(self) -> SharedStatusHub {
        Arc::new(self)
    }

    /// Launch every startup probe and start the broadcast scheduler.
    ///
    /// Returns immediately; probes complete in the background. Await the
    /// returned [`ProbeSet`] to observe their completion.
    pub async fn start(&self) -> ProbeSet {
        let probes = self.reprobe();

        let mut slot = self.scheduler.lock().await;
        if slot.is_none() && !self.is_closed() {
            let scheduler = BroadcastScheduler::new(
                self.collector.clone(),
                self.registry.clone(),
                self.broadcast_interval,
            );
            *slot = Some(scheduler.start());
        }

        info!(
            services = self.services.len(),
            interval_secs = self.broadcast_interval.as_secs_f64(),
            "🚀 Status hub started"
        );
        probes
    }

    /// Run every configured probe again
    pub fn reprobe(&self) -> ProbeSet {
        self.probe_runner.launch(&self.table, &self.services)
    }

    /// Cancel the scheduler, then close every connection. Idempotent.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Status hub already shut down");
            return;
        }

        info!("🛑 Status hub shutting down");

        // Stop producing broadcasts before tearing down the registry
        let scheduler = self.scheduler.lock().await.take();
        if let Some(handle) = scheduler {
            handle.cancel().await;
        }

        let closed = self.registry.close_all();
        info!(closed, "✅ Status hub shutdown complete");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Accept a new connection.
    ///
    /// The welcome snapshot is queued on the connection's channel before it
    /// is registered, so it always precedes any broadcast.
    pub fn connect(&self, sender: mpsc::UnboundedSender<String>) -> HubResult<ConnectionId> {
        if self.is_closed() {
            return Err(HubError::ShuttingDown);
        }

        let id = self.registry.allocate_id();
        let snapshot = self.collector.collect_with_connections(self.registry.size() + 1);
        let welcome = OutboundMessage::welcome(&snapshot)
            .encode()
            .map_err(|e| HubError::SendFailure {
                connection_id: id,
                reason: e.to_string(),
            })?;

        sender.send(welcome).map_err(|e| HubError::SendFailure {
            connection_id: id,
            reason: e.to_string(),
        })?;

        self.registry.insert(id, sender);

        // Shutdown may have drained the registry between the check and insert
        if self.is_closed() {
            self.registry.remove(id);
            return Err(HubError::ShuttingDown);
        }

        Ok(id)
    }

    /// Transport reported close or error
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.registry.remove(id)
    }

    /// Dispatch one inbound text frame and send the reply, if any, back to
    /// the same connection.
    pub fn handle_message(&self, id: ConnectionId, raw: &str) {
        self.registry.touch(id);

        let Some(reply) = self.router.route(id, raw, &self.table) else {
            return;
        };

        let kind = reply.kind();
        match reply.encode() {
            Ok(json) => {
                if let Err(e) = self.registry.send_to(id, json) {
                    warn!(connection_id = %id, reply = kind, error = %e, "Reply not delivered");
                }
            }
            Err(e) => error!(connection_id = %id, reply = kind, "Failed to serialize reply: {}", e),
        }
    }

    /// Update one service's status on demand
    pub fn set_status(&self, name: &str, status: ServiceStatus) -> HubResult<()> {
        self.table.set_status(name, status)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.collector.collect()
    }

    pub fn services(&self) -> ServiceTableSnapshot {
        self.table.snapshot()
    }

    pub fn connection_count(&self) -> usize {
        self.registry.size()
    }

    /// Time since the hub was built
    pub fn uptime(&self) -> Duration {
        self.collector.started_at().elapsed()
    }

    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    pub async fn is_broadcasting(&self) -> bool {
        self.scheduler
            .lock()
            .await
            .as_ref()
            .is_some_and(SchedulerHandle::is_running)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::application::health::probe::tests::FixedProbe;
    use crate::application::health::StaticProbe;

    fn config(interval_secs: u64) -> HubConfig {
        HubConfig {
            broadcast_interval_secs: interval_secs,
            ..HubConfig::default()
        }
    }

    fn hub() -> StatusHub {
        StatusHub::new(
            &config(30),
            vec![
                MonitoredService::new("A", Arc::new(StaticProbe)),
                MonitoredService::new(
                    "B",
                    Arc::new(FixedProbe(Err(HubError::probe("B", "exploded")))),
                ),
            ],
        )
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(serde_json::from_str(&msg).unwrap());
        }
        out
    }

    #[tokio::test]
    async fn probes_resolve_to_running_and_error() {
        let hub = hub();
        let fresh = hub.services();
        assert!(fresh.entries().all(|e| e.status == ServiceStatus::Unknown));

        hub.start().await.wait().await;

        let services = hub.services();
        assert_eq!(services.status_of("A"), Some(ServiceStatus::Running));
        assert_eq!(services.status_of("B"), Some(ServiceStatus::Error));
        hub.shutdown().await;
    }

    #[tokio::test]
    async fn welcome_push_counts_new_connection() {
        let hub = hub();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        hub.connect(tx1).unwrap();
        hub.connect(tx2).unwrap();

        let first = drain(&mut rx1);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0]["type"], "connection");
        assert_eq!(first[0]["data"]["activeConnections"], 1);

        let second = drain(&mut rx2);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0]["data"]["activeConnections"], 2);
        assert_eq!(second[0]["data"]["services"]["A"], "unknown");
        assert!(second[0]["data"]["timestamp"].is_string());
        assert_eq!(hub.connection_count(), 2);
    }

    #[tokio::test]
    async fn welcome_to_closed_channel_is_not_registered() {
        let hub = hub();
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        assert!(matches!(hub.connect(tx), Err(HubError::SendFailure { .. })));
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn ping_gets_exactly_one_pong() {
        let hub = hub();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.connect(tx).unwrap();
        drain(&mut rx);

        hub.handle_message(id, r#"{"type":"ping"}"#);

        let replies = drain(&mut rx);
        assert_eq!(replies, vec![serde_json::json!({"type": "pong"})]);
    }

    #[tokio::test]
    async fn get_services_replies_with_table() {
        let hub = hub();
        hub.set_status("A", ServiceStatus::Running).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.connect(tx).unwrap();
        drain(&mut rx);

        hub.handle_message(id, r#"{"type":"get_services"}"#);

        let replies = drain(&mut rx);
        assert_eq!(
            replies,
            vec![serde_json::json!({
                "type": "services_update",
                "data": {"A": "running", "B": "unknown"}
            })]
        );
    }

    #[tokio::test]
    async fn unknown_and_malformed_messages_keep_connection_open() {
        let hub = hub();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.connect(tx).unwrap();
        drain(&mut rx);

        hub.handle_message(id, r#"{"type":"subscribe"}"#);
        hub.handle_message(id, "garbage");

        assert!(drain(&mut rx).is_empty());
        assert_eq!(hub.connection_count(), 1);
    }

    #[tokio::test]
    async fn set_status_unknown_service_is_rejected() {
        let hub = hub();
        let before = hub.services();
        assert_eq!(
            hub.set_status("C", ServiceStatus::Running),
            Err(HubError::UnknownService("C".into()))
        );
        assert_eq!(hub.services(), before);
    }

    #[tokio::test]
    async fn double_disconnect_is_harmless() {
        let hub = hub();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = hub.connect(tx).unwrap();

        assert!(hub.disconnect(id));
        assert!(!hub.disconnect(id));
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn welcome_then_two_broadcasts() {
        let hub = StatusHub::new(&config(1), vec![MonitoredService::new("A", Arc::new(StaticProbe))]);
        hub.start().await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.connect(tx).unwrap();

        tokio::time::sleep(Duration::from_millis(2_500)).await;

        let messages = drain(&mut rx);
        let kinds: Vec<&str> = messages.iter().map(|m| m["type"].as_str().unwrap()).collect();
        assert_eq!(kinds, vec!["connection", "metrics_update", "metrics_update"]);
        assert_eq!(messages[1]["data"]["activeConnections"], 1);

        hub.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_scheduler_then_closes_connections() {
        let hub = StatusHub::new(&config(1), vec![MonitoredService::new("A", Arc::new(StaticProbe))]);
        hub.start().await;
        assert!(hub.is_broadcasting().await);

        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.connect(tx).unwrap();
        drain(&mut rx);

        hub.shutdown().await;
        assert!(!hub.is_broadcasting().await);
        assert_eq!(hub.connection_count(), 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        // Sender dropped by the registry: channel is closed and empty
        assert!(rx.recv().await.is_none());

        hub.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_slot_is_released_while_shutdown_drains() {
        let hub = StatusHub::new(&config(1), vec![MonitoredService::new("A", Arc::new(StaticProbe))]).shared();
        hub.start().await;

        let teardown = tokio::spawn({
            let hub = hub.clone();
            async move { hub.shutdown().await }
        });
        while !hub.is_closed() {
            tokio::task::yield_now().await;
        }

        assert!(hub.scheduler.try_lock().is_ok());
        assert!(!hub.is_broadcasting().await);
        teardown.await.unwrap();
    }

    #[tokio::test]
    async fn connect_after_shutdown_is_refused() {
        let hub = hub();
        hub.shutdown().await;

        let (tx, _rx) = mpsc::unbounded_channel();
        assert_eq!(hub.connect(tx), Err(HubError::ShuttingDown));
        assert_eq!(hub.connection_count(), 0);
    }
}
