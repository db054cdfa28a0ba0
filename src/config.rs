//! Application configuration
//!
//! Loaded from a TOML file (default `~/.config/docgen-hub/config.toml`).
//! Every section has defaults, so a partial file or none at all is valid.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "DOCGEN_HUB_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Default config path: `<config dir>/docgen-hub/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docgen-hub")
        .join("config.toml")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub hub: HubConfig,
    pub documents: DocumentsConfig,
    pub logging: LoggingConfig,
    pub services: Vec<ServiceConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            hub: HubConfig::default(),
            documents: DocumentsConfig::default(),
            logging: LoggingConfig::default(),
            services: default_services(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds allowed for graceful shutdown
    pub shutdown_timeout: u64,
    /// Static platform pages served under `/platform`
    pub platform_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: 30,
            platform_dir: PathBuf::from("FinishThisIdea-Complete/public"),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub broadcast_interval_secs: u64,
    /// Upper bound on writing one frame to a client socket
    pub send_timeout_ms: u64,
    /// Upper bound on one startup probe
    pub probe_timeout_ms: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            broadcast_interval_secs: 30,
            send_timeout_ms: 5_000,
            probe_timeout_ms: 5_000,
        }
    }
}

impl HubConfig {
    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_secs(self.broadcast_interval_secs)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Simulated generation latency
    pub generation_delay_ms: u64,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            generation_delay_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// One monitored backend service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    #[serde(default)]
    pub probe: ProbeConfig,
}

/// How a service's availability is checked at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProbeConfig {
    /// Part of this process; always running
    #[default]
    Static,
    /// Present on disk
    Path { path: PathBuf },
    /// Accepting TCP connections
    Tcp { address: String },
}

fn default_services() -> Vec<ServiceConfig> {
    vec![
        ServiceConfig {
            name: "mvp-compactor".to_string(),
            probe: ProbeConfig::Static,
        },
        ServiceConfig {
            name: "finishthisidea-complete".to_string(),
            probe: ProbeConfig::Path {
                path: PathBuf::from("FinishThisIdea-Complete/public/platform-hub.html"),
            },
        },
        ServiceConfig {
            name: "template-processor".to_string(),
            probe: ProbeConfig::Path {
                path: PathBuf::from("mcp/package.json"),
            },
        },
        ServiceConfig {
            name: "static-files".to_string(),
            probe: ProbeConfig::Static,
        },
    ]
}

impl AppConfig {
    /// Load and validate from `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&raw)?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hub.broadcast_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "hub.broadcast_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.services.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[services]] entry is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for service in &self.services {
            if service.name.trim().is_empty() {
                return Err(ConfigError::Invalid("service name must not be empty".to_string()));
            }
            if !seen.insert(service.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate service name: {}",
                    service.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.hub.broadcast_interval(), Duration::from_secs(30));
        assert_eq!(config.services.len(), 4);
        assert_eq!(config.services[0].name, "mvp-compactor");
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            config.server.platform_dir,
            PathBuf::from("FinishThisIdea-Complete/public")
        );
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.services, AppConfig::from_toml("").unwrap().services);
    }

    #[test]
    fn parses_sections_and_probe_kinds() {
        let raw = r#"
            [server]
            port = 9100
            platform_dir = "site/public"

            [hub]
            broadcast_interval_secs = 5

            [logging]
            format = "json"

            [[services]]
            name = "A"
            probe = { kind = "static" }

            [[services]]
            name = "B"
            probe = { kind = "path", path = "mcp/package.json" }

            [[services]]
            name = "C"
            probe = { kind = "tcp", address = "127.0.0.1:5432" }
        "#;

        let config = AppConfig::from_toml(raw).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.platform_dir, PathBuf::from("site/public"));
        assert_eq!(config.hub.broadcast_interval_secs, 5);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.services.len(), 3);
        assert_eq!(config.services[0].probe, ProbeConfig::Static);
        assert_eq!(
            config.services[1].probe,
            ProbeConfig::Path {
                path: PathBuf::from("mcp/package.json")
            }
        );
        assert_eq!(
            config.services[2].probe,
            ProbeConfig::Tcp {
                address: "127.0.0.1:5432".into()
            }
        );
    }

    #[test]
    fn rejects_zero_interval() {
        let err = AppConfig::from_toml("[hub]\nbroadcast_interval_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_duplicate_service_names() {
        let raw = r#"
            [[services]]
            name = "A"
            [[services]]
            name = "A"
        "#;
        let err = AppConfig::from_toml(raw).unwrap_err();
        assert!(err.to_string().contains("duplicate service name: A"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AppConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
