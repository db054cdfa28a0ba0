pub mod connection;
pub mod registry;

pub use connection::Connection;
pub use registry::{BroadcastReport, ConnectionRegistry, SharedConnectionRegistry};
