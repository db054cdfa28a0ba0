//! Hub error taxonomy
//!
//! Only [`HubError::UnknownService`] is surfaced to callers of the hub API.
//! The other variants are produced internally and converted into state
//! transitions: a probe failure becomes status `error`, a send failure
//! removes the connection, a malformed message is dropped.

use thiserror::Error;

use super::ConnectionId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HubError {
    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Send to connection {connection_id} failed: {reason}")]
    SendFailure {
        connection_id: ConnectionId,
        reason: String,
    },

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Probe for {service} failed: {reason}")]
    ProbeFailure { service: String, reason: String },

    #[error("Hub is shutting down")]
    ShuttingDown,
}

impl HubError {
    pub fn probe(service: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ProbeFailure {
            service: service.into(),
            reason: reason.to_string(),
        }
    }
}

pub type HubResult<T> = Result<T, HubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            HubError::UnknownService("nope".into()).to_string(),
            "Unknown service: nope"
        );
        assert_eq!(
            HubError::probe("A", "boom").to_string(),
            "Probe for A failed: boom"
        );
        let err = HubError::SendFailure {
            connection_id: ConnectionId::new(7),
            reason: "channel closed".into(),
        };
        assert_eq!(err.to_string(), "Send to connection #7 failed: channel closed");
    }
}
