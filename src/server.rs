//! Reusable status hub server runtime.
//!
//! Provides [`ServerHandle`] that encapsulates the full server lifecycle:
//! hub startup (probes + broadcast scheduler), the combined REST/WebSocket
//! listener, and graceful shutdown.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::{SharedStatusHub, StatusHub};
use crate::config::AppConfig;
use crate::interfaces::http::{create_router, AppState};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the status hub server.
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running status hub server.
///
/// # Examples
///
/// ```rust,no_run
/// use docgen_hub::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     // ... wait for shutdown signal ...
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// The hub serving realtime clients.
    pub hub: SharedStatusHub,
    /// The configuration the server was started with.
    pub config: AppConfig,

    local_addr: SocketAddr,
    shutdown: ShutdownCoordinator,
    api_task: JoinHandle<()>,
}

impl ServerHandle {
    /// Start the server with the given options.
    ///
    /// This will:
    /// 1. Build the hub and launch every startup probe (not awaited)
    /// 2. Start the broadcast scheduler
    /// 3. Bind the listener and serve REST + WebSocket routes
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting docgen status hub...");

        // ── Hub ────────────────────────────────────────────────
        let hub = StatusHub::from_config(&app_cfg).shared();
        let probes = hub.start().await;
        tokio::spawn(async move {
            let count = probes.len();
            probes.wait().await;
            info!("🔎 {} startup probes finished", count);
        });

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // ── REST API + WebSocket server ────────────────────────
        let router = create_router(
            AppState::new(
                hub.clone(),
                Duration::from_millis(app_cfg.documents.generation_delay_ms),
            )
            .with_platform_dir(&app_cfg.server.platform_dir),
        );

        let addr = app_cfg.server.address();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!("HTTP server listening on http://{}", local_addr);
        info!("WebSocket endpoint at ws://{}/ws", local_addr);
        info!("Platform hub at http://{}/platform/platform-hub.html", local_addr);
        info!("OpenAPI document at http://{}/api/v1/docs", local_addr);

        let api_hub = hub.clone();
        let api_server = axum::serve(listener, router).with_graceful_shutdown(async move {
            shutdown_signal.wait().await;
            info!("🛑 HTTP server received shutdown signal");
            // Realtime clients go first: scheduler stops, sockets close
            api_hub.shutdown().await;
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("HTTP server error: {}", e);
            }
        });

        info!("🚀 Status hub started.");

        Ok(Self {
            hub,
            config: app_cfg,
            local_addr,
            shutdown,
            api_task,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    ///
    /// Call [`wait`](Self::wait) to block until everything has stopped.
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the shutdown signal, then for the server to drain, bounded
    /// by the configured shutdown timeout.
    pub async fn wait(mut self) {
        info!("⏳ Waiting for server tasks to complete...");

        let task = &mut self.api_task;
        let drained = self
            .shutdown
            .shutdown_with_cleanup(|| async move {
                match task.await {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => error!("HTTP server task panicked: {}", e),
                }
            })
            .await;

        if !drained {
            warn!("Aborting HTTP server after shutdown timeout");
            self.api_task.abort();
        }

        // No-op when the graceful shutdown hook already ran
        self.hub.shutdown().await;

        info!("👋 Status hub shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("🛑 Shutting down status hub...");
        self.trigger_shutdown();
        self.wait().await;
    }

    /// Check if the server is still running.
    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProbeConfig, ServiceConfig};

    fn options() -> ServerOptions {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.server.shutdown_timeout = 5;
        config.services = vec![ServiceConfig {
            name: "static-files".to_string(),
            probe: ProbeConfig::Static,
        }];
        ServerOptions { config }
    }

    #[tokio::test]
    async fn start_binds_ephemeral_port_and_shuts_down() {
        let handle = ServerHandle::start(options()).await.unwrap();
        assert_ne!(handle.local_addr().port(), 0);
        assert!(handle.is_running());
        assert!(handle.hub.is_broadcasting().await);

        let hub = handle.hub.clone();
        handle.shutdown().await;
        assert!(hub.is_closed());
        assert!(!hub.is_broadcasting().await);
    }

    #[tokio::test]
    async fn start_rejects_invalid_config() {
        let mut opts = options();
        opts.config.services.clear();
        assert!(ServerHandle::start(opts).await.is_err());
    }
}
