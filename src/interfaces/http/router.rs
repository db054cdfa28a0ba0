//! API router with OpenAPI document

use std::path::PathBuf;
use std::time::Duration;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::application::SharedStatusHub;
use crate::config::ServerConfig;
use crate::domain::ServiceStatus;
use crate::interfaces::ws::{ws_hub_handler, ws_root_handler};

use super::common::{ApiResponse, ErrorBody, ErrorDetail};
use super::handlers::{api_info, documents, status, templates};

/// Unified router state. Handlers extract the part they need via `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub hub: SharedStatusHub,
    pub documents: documents::DocumentsState,
    /// Root of the static pages under `/platform`
    pub platform_dir: PathBuf,
}

impl AppState {
    pub fn new(hub: SharedStatusHub, generation_delay: Duration) -> Self {
        Self {
            hub,
            documents: documents::DocumentsState { generation_delay },
            platform_dir: ServerConfig::default().platform_dir,
        }
    }

    pub fn with_platform_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.platform_dir = dir.into();
        self
    }
}

impl FromRef<AppState> for SharedStatusHub {
    fn from_ref(s: &AppState) -> Self {
        s.hub.clone()
    }
}

impl FromRef<AppState> for documents::DocumentsState {
    fn from_ref(s: &AppState) -> Self {
        s.documents.clone()
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        status::liveness,
        status::health_check,
        status::get_metrics,
        // Services
        status::list_services,
        status::refresh_services,
        // Info
        api_info::api_info,
        // Documents
        documents::generate_document,
        documents::list_documents,
        documents::download_document,
        // Templates
        templates::list_templates,
        templates::get_template,
    ),
    components(
        schemas(
            ApiResponse<String>,
            ErrorBody,
            ErrorDetail,
            ServiceStatus,
            status::LivenessResponse,
            status::HealthResponse,
            status::MetricsResponse,
            status::ServicesResponse,
            status::RefreshResponse,
            api_info::ApiInfo,
            documents::GenerateDocumentRequest,
            documents::GeneratedDocument,
            documents::DocumentMetadata,
            documents::DocumentSummary,
            documents::DocumentListResponse,
            templates::TemplateSummary,
            templates::TemplateDetail,
            templates::TemplateStructure,
            templates::TemplateListResponse,
        )
    ),
    tags(
        (name = "Health", description = "Hub health and metrics snapshots"),
        (name = "Services", description = "Monitored backend services and their status"),
        (name = "Info", description = "API information"),
        (name = "Documents", description = "Mock document generation"),
        (name = "Templates", description = "Document template catalogue"),
    ),
    info(
        title = "Document Generator Status Hub API",
        version = "0.1.0",
        description = "Realtime service status over WebSocket (`/ws`) plus mock document endpoints",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create the router serving the REST API, the WebSocket upgrade and the
/// static platform pages
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let document_routes = Router::new()
        .route("/", get(documents::list_documents))
        .route("/generate", post(documents::generate_document))
        .route("/{id}/download", get(documents::download_document));

    let template_routes = Router::new()
        .route("/", get(templates::list_templates))
        .route("/{id}", get(templates::get_template));

    let platform = ServeDir::new(&state.platform_dir);

    Router::new()
        // Realtime, or a redirect to the landing page for plain visits
        .route("/", get(ws_root_handler))
        .route("/ws", get(ws_hub_handler))
        .nest_service("/platform", platform)
        // Hub status
        .route("/health", get(status::liveness))
        .route("/api/health", get(status::health_check))
        .route("/api/metrics", get(status::get_metrics))
        .route("/api/services", get(status::list_services))
        .route("/api/services/refresh", post(status::refresh_services))
        // Document API
        .route("/api/v1", get(api_info::api_info))
        .route("/api/v1/docs", get(openapi_json))
        .nest("/api/v1/documents", document_routes)
        .nest("/api/v1/templates", template_routes)
        .fallback(api_info::not_found)
        .with_state(state)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
