//! Service health: the status table and the startup probes that fill it

pub mod probe;
pub mod runner;
pub mod table;

pub use probe::{MonitoredService, PathProbe, ServiceProbe, StaticProbe, TcpProbe};
pub use runner::{ProbeRunner, ProbeSet};
pub use table::{ServiceHealthTable, SharedServiceHealthTable};
