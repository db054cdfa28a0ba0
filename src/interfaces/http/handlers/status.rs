//! Hub status endpoints: health, metrics and the service table

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::SharedStatusHub;
use crate::domain::ServiceMap;
use crate::interfaces::http::common::ApiResponse;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Milliseconds since startup
    pub uptime: u64,
    #[schema(value_type = Object)]
    pub services: ServiceMap,
    pub timestamp: DateTime<Utc>,
}

/// Liveness of the process itself, independent of monitored services
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LivenessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    /// Seconds since startup, fractional
    pub uptime: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    /// Seconds since startup
    pub uptime: u64,
    pub active_connections: usize,
    #[schema(value_type = Object)]
    pub services: ServiceMap,
    pub sequence: u64,
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServicesResponse {
    #[schema(value_type = Object)]
    pub services: ServiceMap,
    /// Services currently `running`
    pub healthy: usize,
    pub total: usize,
    /// When each service last reached a terminal status
    #[schema(value_type = Object)]
    pub last_checked: BTreeMap<String, Option<DateTime<Utc>>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    /// Probes launched by this request
    pub launched: usize,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Hub is up", body = HealthResponse)
    )
)]
pub async fn health_check(State(hub): State<SharedStatusHub>) -> Json<HealthResponse> {
    let snapshot = hub.snapshot();
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime: snapshot.uptime_ms,
        services: snapshot.services.statuses(),
        timestamp: snapshot.timestamp,
    })
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Process is up", body = LivenessResponse)
    )
)]
pub async fn liveness(State(hub): State<SharedStatusHub>) -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: hub.uptime().as_secs_f64(),
    })
}

#[utoipa::path(
    get,
    path = "/api/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Current metrics snapshot", body = ApiResponse<MetricsResponse>)
    )
)]
pub async fn get_metrics(State(hub): State<SharedStatusHub>) -> Json<ApiResponse<MetricsResponse>> {
    let snapshot = hub.snapshot();
    Json(ApiResponse::success(MetricsResponse {
        uptime: snapshot.uptime_secs,
        active_connections: snapshot.active_connections,
        services: snapshot.services.statuses(),
        sequence: snapshot.sequence,
        last_update: snapshot.timestamp,
    }))
}

#[utoipa::path(
    get,
    path = "/api/services",
    tag = "Services",
    responses(
        (status = 200, description = "Monitored services", body = ServicesResponse)
    )
)]
pub async fn list_services(State(hub): State<SharedStatusHub>) -> Json<ServicesResponse> {
    let table = hub.services();
    let last_checked = table
        .entries()
        .map(|e| (e.name.clone(), e.last_checked))
        .collect();

    Json(ServicesResponse {
        services: table.statuses(),
        healthy: table.healthy(),
        total: table.len(),
        last_checked,
    })
}

#[utoipa::path(
    post,
    path = "/api/services/refresh",
    tag = "Services",
    responses(
        (status = 202, description = "Probes relaunched", body = ApiResponse<RefreshResponse>),
        (status = 503, description = "Hub is shutting down", body = ApiResponse<String>)
    )
)]
pub async fn refresh_services(
    State(hub): State<SharedStatusHub>,
) -> (StatusCode, Json<ApiResponse<RefreshResponse>>) {
    if hub.is_closed() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::error("Hub is shutting down")),
        );
    }

    let probes = hub.reprobe();
    (
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(RefreshResponse {
            launched: probes.len(),
        })),
    )
}
