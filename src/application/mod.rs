pub mod commands;
pub mod health;
pub mod hub;
pub mod services;
pub mod session;

// Re-export key types for convenience
pub use commands::{CommandRouter, InboundMessage, OutboundMessage};
pub use health::{
    MonitoredService, ProbeRunner, ProbeSet, ServiceHealthTable, ServiceProbe,
    SharedServiceHealthTable,
};
pub use hub::{SharedStatusHub, StatusHub};
pub use services::{BroadcastScheduler, MetricsCollector, SchedulerHandle};
pub use session::{ConnectionRegistry, SharedConnectionRegistry};
