//! Monitored backend services and their liveness status

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Last-known liveness of a monitored service.
///
/// `Unknown` until the startup probe launches, `Checking` while it is in
/// flight, then one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Unknown,
    Checking,
    Running,
    Missing,
    Error,
}

impl ServiceStatus {
    /// Whether a probe has finished for this service
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Running | Self::Missing | Self::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Checking => "checking",
            Self::Running => "running",
            Self::Missing => "missing",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the service health table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceEntry {
    pub name: String,
    pub status: ServiceStatus,
    pub last_checked: Option<DateTime<Utc>>,
}

impl ServiceEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ServiceStatus::Unknown,
            last_checked: None,
        }
    }
}
