//! Inbound command dispatch for a single connection

use tracing::{debug, warn};

use crate::application::health::ServiceHealthTable;
use crate::domain::{ConnectionId, HubError, HubResult};

use super::messages::{InboundMessage, OutboundMessage};

/// Stateless dispatcher over the closed set of client commands.
///
/// Reads the service table but never mutates it or the connection registry.
/// Unknown and malformed messages produce no reply; they are only logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRouter;

impl CommandRouter {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(raw: &str) -> HubResult<InboundMessage> {
        serde_json::from_str(raw).map_err(|e| HubError::MalformedMessage(e.to_string()))
    }

    /// Reply to send back to `connection`, if any
    pub fn route(
        &self,
        connection: ConnectionId,
        raw: &str,
        table: &ServiceHealthTable,
    ) -> Option<OutboundMessage> {
        let message = match Self::parse(raw) {
            Ok(message) => message,
            Err(e) => {
                warn!(connection_id = %connection, error = %e, "Dropping inbound message");
                return None;
            }
        };

        debug!(connection_id = %connection, ?message, "Inbound command");

        Some(match message {
            InboundMessage::Ping => OutboundMessage::Pong,
            InboundMessage::GetServices => OutboundMessage::ServicesUpdate(table.snapshot().statuses()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ServiceStatus;

    const CONN: ConnectionId = ConnectionId::new(1);

    fn table() -> ServiceHealthTable {
        let table = ServiceHealthTable::new(["A", "B"]);
        table.set_status("A", ServiceStatus::Running).unwrap();
        table
    }

    #[test]
    fn ping_replies_pong() {
        let reply = CommandRouter::new().route(CONN, r#"{"type":"ping"}"#, &table());
        assert_eq!(reply, Some(OutboundMessage::Pong));
    }

    #[test]
    fn get_services_replies_with_current_table() {
        let table = table();
        let reply = CommandRouter::new().route(CONN, r#"{"type":"get_services"}"#, &table);

        match reply {
            Some(OutboundMessage::ServicesUpdate(services)) => {
                assert_eq!(services.get("A"), Some(&ServiceStatus::Running));
                assert_eq!(services.get("B"), Some(&ServiceStatus::Unknown));
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[test]
    fn unknown_kind_gets_no_reply() {
        assert!(CommandRouter::new()
            .route(CONN, r#"{"type":"launch_missiles"}"#, &table())
            .is_none());
    }

    #[test]
    fn malformed_payloads_get_no_reply() {
        let router = CommandRouter::new();
        let table = table();
        for raw in ["", "not json", "[1,2,3]", r#"{"type":42}"#, "{"] {
            assert!(router.route(CONN, raw, &table).is_none(), "replied to {raw:?}");
        }
    }

    #[test]
    fn parse_reports_malformed_message() {
        assert!(matches!(
            CommandRouter::parse("nope"),
            Err(HubError::MalformedMessage(_))
        ));
    }

    #[test]
    fn routing_does_not_mutate_table() {
        let table = table();
        let before = table.snapshot();
        let router = CommandRouter::new();
        router.route(CONN, r#"{"type":"get_services"}"#, &table);
        router.route(CONN, r#"{"type":"ping"}"#, &table);
        assert_eq!(table.snapshot(), before);
    }
}
