//! Client command protocol and routing

pub mod messages;
pub mod router;

pub use messages::{ConnectionData, InboundMessage, MetricsData, OutboundMessage};
pub use router::CommandRouter;
