//! Realtime wire protocol (JSON text frames)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{MetricsSnapshot, ServiceMap};

/// Client → server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Ping,
    GetServices,
}

/// Server → client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Welcome push sent once, right after accept
    Connection(ConnectionData),
    /// Periodic broadcast
    MetricsUpdate(MetricsData),
    Pong,
    ServicesUpdate(ServiceMap),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionData {
    pub active_connections: usize,
    pub services: ServiceMap,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsData {
    /// Seconds since process start
    pub uptime: u64,
    pub active_connections: usize,
    pub services: ServiceMap,
    pub timestamp: DateTime<Utc>,
}

impl OutboundMessage {
    pub fn welcome(snapshot: &MetricsSnapshot) -> Self {
        Self::Connection(ConnectionData {
            active_connections: snapshot.active_connections,
            services: snapshot.services.statuses(),
            timestamp: snapshot.timestamp,
        })
    }

    pub fn metrics_update(snapshot: &MetricsSnapshot) -> Self {
        Self::MetricsUpdate(MetricsData {
            uptime: snapshot.uptime_secs,
            active_connections: snapshot.active_connections,
            services: snapshot.services.statuses(),
            timestamp: snapshot.timestamp,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::MetricsUpdate(_) => "metrics_update",
            Self::Pong => "pong",
            Self::ServicesUpdate(_) => "services_update",
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ServiceStatus;
    use serde_json::json;

    #[test]
    fn pong_is_bare_type() {
        let json: serde_json::Value =
            serde_json::from_str(&OutboundMessage::Pong.encode().unwrap()).unwrap();
        assert_eq!(json, json!({"type": "pong"}));
    }

    #[test]
    fn services_update_carries_map_as_data() {
        let mut services = ServiceMap::new();
        services.insert("static-files".into(), ServiceStatus::Running);
        let msg = OutboundMessage::ServicesUpdate(services);

        let json: serde_json::Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();
        assert_eq!(
            json,
            json!({"type": "services_update", "data": {"static-files": "running"}})
        );
    }

    #[test]
    fn metrics_update_uses_camel_case_fields() {
        let msg = OutboundMessage::MetricsUpdate(MetricsData {
            uptime: 12,
            active_connections: 3,
            services: ServiceMap::new(),
            timestamp: Utc::now(),
        });
        let json: serde_json::Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();
        assert_eq!(json["type"], "metrics_update");
        assert_eq!(json["data"]["uptime"], 12);
        assert_eq!(json["data"]["activeConnections"], 3);
        assert!(json["data"]["timestamp"].is_string());
    }

    #[test]
    fn inbound_parses_known_kinds() {
        let ping: InboundMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(ping, InboundMessage::Ping);
        let get: InboundMessage = serde_json::from_str(r#"{"type":"get_services","extra":1}"#).unwrap();
        assert_eq!(get, InboundMessage::GetServices);
    }

    #[test]
    fn inbound_rejects_unknown_kind() {
        assert!(serde_json::from_str::<InboundMessage>(r#"{"type":"subscribe"}"#).is_err());
        assert!(serde_json::from_str::<InboundMessage>(r#"{"kind":"ping"}"#).is_err());
    }
}
