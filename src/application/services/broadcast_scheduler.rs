//! Broadcast Scheduler
//!
//! Periodically pushes a fresh `metrics_update` snapshot to every open
//! connection until cancelled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::application::commands::OutboundMessage;
use crate::application::session::{BroadcastReport, SharedConnectionRegistry};
use crate::shared::ShutdownSignal;

use super::collector::MetricsCollector;

/// Default broadcast period
pub const DEFAULT_BROADCAST_INTERVAL: Duration = Duration::from_secs(30);

pub struct BroadcastScheduler {
    collector: Arc<MetricsCollector>,
    registry: SharedConnectionRegistry,
    period: Duration,
}

impl BroadcastScheduler {
    pub fn new(
        collector: Arc<MetricsCollector>,
        registry: SharedConnectionRegistry,
        period: Duration,
    ) -> Self {
        Self {
            collector,
            registry,
            // tokio intervals panic on a zero period
            period: period.max(Duration::from_millis(1)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// One broadcast tick: snapshot the table and registry, then fan out.
    pub fn tick(&self) -> Option<BroadcastReport> {
        let snapshot = self.collector.collect();
        let message = match OutboundMessage::metrics_update(&snapshot).encode() {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize metrics update: {}", e);
                return None;
            }
        };

        let report = self.registry.broadcast(&message);
        ::metrics::counter!("hub_broadcast_ticks_total").increment(1);
        debug!(
            sequence = snapshot.sequence,
            delivered = report.delivered,
            removed = report.removed.len(),
            "📈 Metrics broadcast"
        );
        Some(report)
    }

    /// Spawn the timer task. The first tick fires one period after start;
    /// new clients are covered by their welcome push until then.
    pub fn start(self) -> SchedulerHandle {
        let cancel = ShutdownSignal::new();
        let running = Arc::new(AtomicBool::new(true));

        let task_cancel = cancel.clone();
        let task_running = running.clone();
        let task = tokio::spawn(async move {
            info!("📡 Broadcast scheduler started (interval: {:?})", self.period);

            let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
            // A late tick is not followed by a burst of catch-up ticks
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.wait() => break,
                    _ = interval.tick() => {
                        if task_cancel.is_triggered() {
                            break;
                        }
                        self.tick();
                    }
                }
            }

            task_running.store(false, Ordering::SeqCst);
            info!("📡 Broadcast scheduler stopped");
        });

        SchedulerHandle {
            cancel,
            running,
            task,
        }
    }
}

/// Cancellation handle for a running [`BroadcastScheduler`]
pub struct SchedulerHandle {
    cancel: ShutdownSignal,
    running: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the timer and wait for the task to exit. No tick runs after this
    /// returns.
    pub async fn cancel(self) {
        self.cancel.trigger();
        if let Err(e) = self.task.await {
            error!("Broadcast scheduler task failed: {}", e);
        }
    }
}
