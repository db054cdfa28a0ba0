//! Outer adapters: the WebSocket hub endpoint and the REST API

pub mod http;
pub mod ws;
