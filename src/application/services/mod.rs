pub mod broadcast_scheduler;
pub mod collector;

pub use broadcast_scheduler::{BroadcastScheduler, SchedulerHandle, DEFAULT_BROADCAST_INTERVAL};
pub use collector::MetricsCollector;
