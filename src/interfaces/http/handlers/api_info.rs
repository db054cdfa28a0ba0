//! API root and fallback

use std::collections::BTreeMap;

use axum::http::{Method, Uri};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::interfaces::http::common::ApiError;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiInfo {
    pub message: String,
    pub version: String,
    pub endpoints: BTreeMap<String, String>,
}

#[utoipa::path(
    get,
    path = "/api/v1",
    tag = "Info",
    responses(
        (status = 200, description = "API information", body = ApiInfo)
    )
)]
pub async fn api_info() -> Json<ApiInfo> {
    let endpoints = [
        ("health", "/health"),
        ("status", "/api/health"),
        ("metrics", "/api/metrics"),
        ("services", "/api/services"),
        ("generate", "/api/v1/documents/generate"),
        ("documents", "/api/v1/documents"),
        ("templates", "/api/v1/templates"),
        ("docs", "/api/v1/docs"),
        ("websocket", "/ws"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    Json(ApiInfo {
        message: "Document Generator Status Hub".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
    })
}

/// 404 for every unmatched route
pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::not_found(format!("Endpoint {} {} not found", method, uri.path()))
        .with_suggestion("Visit /api/v1 for available endpoints")
}
