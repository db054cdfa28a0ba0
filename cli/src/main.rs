//! Docgen status hub - CLI server
//!
//! Headless realtime status hub suitable for deployment as a systemd
//! service, Docker container, or standalone process.
//!
//! ```sh
//! # Run with default config (~/.config/docgen-hub/config.toml)
//! docgen-hub
//!
//! # Custom config path
//! docgen-hub --config /etc/docgen-hub/config.toml
//!
//! # Override port and broadcast period
//! docgen-hub --port 3000 --broadcast-interval 10
//!
//! # Validate config without starting
//! docgen-hub --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use docgen_hub::config::{AppConfig, CONFIG_ENV_VAR};
use docgen_hub::server::{init_tracing, ServerHandle, ServerOptions};

/// Docgen status hub - realtime service status over WebSocket.
#[derive(Parser, Debug)]
#[command(
    name = "docgen-hub",
    version,
    about = "Realtime status hub for the document generator platform",
    long_about = "Docgen status hub: WebSocket + REST API server that reports \
                  the liveness of the platform's backend services.\n\n\
                  Default config: ~/.config/docgen-hub/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Override the listen host.
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Override the broadcast period in seconds.
    #[arg(long)]
    broadcast_interval: Option<u64>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(docgen_hub::default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(ref host) = cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(secs) = cli.broadcast_interval {
        config.hub.broadcast_interval_secs = secs;
    }

    // Init tracing once the effective log level is known
    init_tracing(&config);

    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) if cli.check => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            return Err(e.into());
        }
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        config.validate()?;
        println!("✅ Configuration is valid");
        println!("   Config file        : {}", config_path.display());
        println!("   Listen address     : {}", config.server.address());
        println!("   Broadcast interval : {}s", config.hub.broadcast_interval_secs);
        println!("   Log level          : {}", config.logging.level);
        println!("   Services           : {}", config.services.len());
        for service in &config.services {
            println!("     - {} ({:?})", service.name, service.probe);
        }
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions { config }).await?;

    // Install OS signal handlers (SIGTERM, SIGINT)
    handle.install_signal_handler();

    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.wait().await;

    Ok(())
}
