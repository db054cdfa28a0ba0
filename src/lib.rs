//! # Docgen Status Hub
//!
//! Realtime status hub for the document generator platform: tracks the
//! liveness of a fixed set of backend services and pushes consolidated
//! status snapshots to WebSocket clients, alongside a small mock document
//! REST API.
//!
//! ## Architecture
//!
//! - **domain**: status values, snapshots, connection identity and errors
//! - **application**: connection registry, service health table and probes,
//!   broadcast scheduler, command router and the [`StatusHub`] composition root
//! - **interfaces**: axum WebSocket handler and REST handlers
//! - **shared**: shutdown signalling
//! - **config**: TOML-backed application configuration
//! - **server**: server lifecycle and tracing initialisation

pub mod application;
pub mod config;
pub mod domain;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use application::{SharedStatusHub, StatusHub};
pub use config::{default_config_path, AppConfig, ConfigError, CONFIG_ENV_VAR};
pub use domain::{ConnectionId, HubError, HubResult, ServiceStatus};
pub use interfaces::http::create_router;
pub use server::{init_tracing, ServerHandle, ServerOptions};
