//! WebSocket interfaces
//!
//! - `hub_socket`: realtime status stream for hub clients

pub mod hub_socket;

pub use hub_socket::{ws_hub_handler, ws_root_handler, LANDING_PAGE};
