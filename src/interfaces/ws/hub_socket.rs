//! WebSocket handler for status hub clients
//!
//! Each upgraded socket is split into a writer task draining the
//! connection's outbound channel and a reader task dispatching inbound text
//! frames to the hub. Whichever finishes first tears down the other.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::application::SharedStatusHub;

/// WebSocket upgrade handler for hub clients
pub async fn ws_hub_handler(
    ws: WebSocketUpgrade,
    State(hub): State<SharedStatusHub>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_hub_socket(socket, hub))
}

/// Plain page visits to `/` land on the platform hub
pub const LANDING_PAGE: &str = "/platform/platform-hub.html";

/// `/` serves both browsers and hub clients: upgrade requests join the hub,
/// anything else is redirected to the landing page.
pub async fn ws_root_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(hub): State<SharedStatusHub>,
) -> Response {
    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| handle_hub_socket(socket, hub)),
        Err(_) => (StatusCode::FOUND, [(header::LOCATION, LANDING_PAGE)]).into_response(),
    }
}

/// Drive one client connection from accept to close
async fn handle_hub_socket(socket: WebSocket, hub: SharedStatusHub) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let id = match hub.connect(tx) {
        Ok(id) => id,
        Err(e) => {
            warn!("Rejecting hub client: {}", e);
            let _ = ws_sender.send(Message::Close(None)).await;
            return;
        }
    };

    info!(connection_id = %id, "🔌 Hub client connected");

    // Outgoing: welcome, replies and broadcasts, in channel order
    let send_timeout = hub.send_timeout();
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match tokio::time::timeout(send_timeout, ws_sender.send(Message::Text(msg.into()))).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(connection_id = %id, "Send error: {}", e);
                    return;
                }
                Err(_) => {
                    warn!(connection_id = %id, "Send timed out after {:?}", send_timeout);
                    return;
                }
            }
        }

        // Registry dropped our sender: the hub closed this connection
        let _ = ws_sender.send(Message::Close(None)).await;
    });

    // Incoming
    let recv_hub = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    debug!(connection_id = %id, "<- {}", text.as_str());
                    recv_hub.handle_message(id, text.as_str());
                }
                Ok(Message::Binary(data)) => {
                    warn!(
                        connection_id = %id,
                        "Binary frame received ({} bytes), dropping as malformed",
                        data.len()
                    );
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(Message::Close(frame)) => {
                    debug!(connection_id = %id, "Close frame received: {:?}", frame);
                    break;
                }
                Err(e) => {
                    warn!(connection_id = %id, "WebSocket error: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.disconnect(id);
    info!(connection_id = %id, "Hub client disconnected");
}
