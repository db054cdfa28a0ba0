//! Startup availability probes for monitored services

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::{debug, error, warn};

use crate::config::ProbeConfig;
use crate::domain::{HubError, HubResult, ServiceStatus};

/// One-shot availability check against a collaborator.
///
/// Returning `Err` means the check itself could not be carried out; the
/// runner records that as status `error`.
#[async_trait]
pub trait ServiceProbe: Send + Sync {
    async fn check(&self) -> HubResult<ServiceStatus>;
}

/// A service that lives inside this process: always running
#[derive(Debug, Clone, Default)]
pub struct StaticProbe;

#[async_trait]
impl ServiceProbe for StaticProbe {
    async fn check(&self) -> HubResult<ServiceStatus> {
        Ok(ServiceStatus::Running)
    }
}

/// Presence check for a file or directory on disk.
/// Absence is `missing`, not a failure.
#[derive(Debug, Clone)]
pub struct PathProbe {
    service: String,
    path: PathBuf,
}

impl PathProbe {
    pub fn new(service: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            service: service.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl ServiceProbe for PathProbe {
    async fn check(&self) -> HubResult<ServiceStatus> {
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| HubError::probe(&self.service, e))?;
        debug!(service = %self.service, path = %self.path.display(), exists, "Path probe finished");
        Ok(if exists {
            ServiceStatus::Running
        } else {
            ServiceStatus::Missing
        })
    }
}

/// TCP reachability check. A refused connection means nothing is listening
/// (`missing`); any other failure is a probe failure.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    service: String,
    address: String,
}

impl TcpProbe {
    pub fn new(service: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            address: address.into(),
        }
    }
}

#[async_trait]
impl ServiceProbe for TcpProbe {
    async fn check(&self) -> HubResult<ServiceStatus> {
        match TcpStream::connect(&self.address).await {
            Ok(_) => Ok(ServiceStatus::Running),
            Err(e) if e.kind() == ErrorKind::ConnectionRefused => Ok(ServiceStatus::Missing),
            Err(e) => Err(HubError::probe(&self.service, e)),
        }
    }
}

/// A monitored service: its table key plus the probe that checks it
#[derive(Clone)]
pub struct MonitoredService {
    pub name: String,
    pub probe: Arc<dyn ServiceProbe>,
}

impl MonitoredService {
    pub fn new(name: impl Into<String>, probe: Arc<dyn ServiceProbe>) -> Self {
        Self {
            name: name.into(),
            probe,
        }
    }

    pub fn from_config(name: &str, config: &ProbeConfig) -> Self {
        let probe: Arc<dyn ServiceProbe> = match config {
            ProbeConfig::Static => Arc::new(StaticProbe),
            ProbeConfig::Path { path } => Arc::new(PathProbe::new(name, path)),
            ProbeConfig::Tcp { address } => Arc::new(TcpProbe::new(name, address.clone())),
        };
        Self::new(name, probe)
    }
}

impl std::fmt::Debug for MonitoredService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitoredService")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Runs `probe` to completion, bounded by `timeout`, and folds every kind of
/// failure (error, panic, timeout, non-terminal answer) into `error`.
pub(crate) async fn run_probe(
    name: &str,
    probe: Arc<dyn ServiceProbe>,
    timeout: Duration,
) -> ServiceStatus {
    let mut check = tokio::spawn(async move { probe.check().await });

    match tokio::time::timeout(timeout, &mut check).await {
        Ok(Ok(Ok(status))) if status.is_terminal() => status,
        Ok(Ok(Ok(status))) => {
            warn!(service = name, %status, "Probe returned a non-terminal status");
            ServiceStatus::Error
        }
        Ok(Ok(Err(e))) => {
            warn!(service = name, error = %e, "Probe failed");
            ServiceStatus::Error
        }
        Ok(Err(e)) => {
            error!(service = name, error = %e, "Probe task panicked");
            ServiceStatus::Error
        }
        Err(_) => {
            check.abort();
            warn!(service = name, timeout_ms = timeout.as_millis() as u64, "Probe timed out");
            ServiceStatus::Error
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Probe with a scripted outcome
    pub(crate) struct FixedProbe(pub HubResult<ServiceStatus>);

    #[async_trait]
    impl ServiceProbe for FixedProbe {
        async fn check(&self) -> HubResult<ServiceStatus> {
            self.0.clone()
        }
    }

    pub(crate) struct PanickingProbe;

    #[async_trait]
    impl ServiceProbe for PanickingProbe {
        async fn check(&self) -> HubResult<ServiceStatus> {
            panic!("probe exploded")
        }
    }

    pub(crate) struct SlowProbe(pub Duration);

    #[async_trait]
    impl ServiceProbe for SlowProbe {
        async fn check(&self) -> HubResult<ServiceStatus> {
            tokio::time::sleep(self.0).await;
            Ok(ServiceStatus::Running)
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn static_probe_is_running() {
        assert_eq!(StaticProbe.check().await.unwrap(), ServiceStatus::Running);
    }

    #[tokio::test]
    async fn path_probe_present_and_absent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("package.json");
        std::fs::write(&file, "{}").unwrap();

        let present = PathProbe::new("tp", &file);
        assert_eq!(present.check().await.unwrap(), ServiceStatus::Running);

        let absent = PathProbe::new("tp", dir.path().join("nope.html"));
        assert_eq!(absent.check().await.unwrap(), ServiceStatus::Missing);
    }

    #[tokio::test]
    async fn tcp_probe_detects_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let probe = TcpProbe::new("svc", addr.to_string());
        assert_eq!(probe.check().await.unwrap(), ServiceStatus::Running);

        drop(listener);
        let probe = TcpProbe::new("svc", addr.to_string());
        assert_eq!(probe.check().await.unwrap(), ServiceStatus::Missing);
    }

    #[tokio::test]
    async fn run_probe_maps_failure_to_error() {
        let probe = Arc::new(FixedProbe(Err(HubError::probe("b", "io"))));
        assert_eq!(run_probe("b", probe, TIMEOUT).await, ServiceStatus::Error);
    }

    #[tokio::test]
    async fn run_probe_maps_panic_to_error() {
        assert_eq!(
            run_probe("b", Arc::new(PanickingProbe), TIMEOUT).await,
            ServiceStatus::Error
        );
    }

    #[tokio::test]
    async fn run_probe_maps_non_terminal_to_error() {
        let probe = Arc::new(FixedProbe(Ok(ServiceStatus::Checking)));
        assert_eq!(run_probe("b", probe, TIMEOUT).await, ServiceStatus::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn run_probe_times_out() {
        let probe = Arc::new(SlowProbe(Duration::from_secs(60)));
        assert_eq!(
            run_probe("slow", probe, Duration::from_secs(1)).await,
            ServiceStatus::Error
        );
    }
}
