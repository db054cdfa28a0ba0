//! Mock document generation API
//!
//! Nothing is rendered or stored: generation waits out a configured delay
//! and answers with a completed record, listing serves a fixed catalogue,
//! and download returns a placeholder PDF body.

use std::time::{Duration, Instant};

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::interfaces::http::common::validated_json::ReportedFields;
use crate::interfaces::http::common::{ErrorBody, ValidatedJson};

/// Characters per estimated page
const CHARS_PER_PAGE: usize = 500;

const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Clone)]
pub struct DocumentsState {
    pub generation_delay: Duration,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GenerateDocumentRequest {
    #[validate(required, length(min = 1))]
    pub template: Option<String>,
    #[validate(required, length(min = 1))]
    pub content: Option<String>,
    #[serde(default = "default_format")]
    pub format: String,
}

impl ReportedFields for GenerateDocumentRequest {
    const FIELDS: &'static [&'static str] = &["template", "content"];
}

fn default_format() -> String {
    "pdf".to_string()
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub content_length: usize,
    pub estimated_pages: usize,
    pub processing_time: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDocument {
    pub id: String,
    pub status: String,
    pub template: String,
    pub format: String,
    pub download_url: String,
    pub created_at: DateTime<Utc>,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub status: String,
    pub template: String,
    pub created_at: String,
    pub size: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Page number, starting at 1
    #[param(value_type = Option<u32>)]
    pub page: Option<String>,
    /// Page size. Default: 10
    #[param(value_type = Option<u32>)]
    pub limit: Option<String>,
}

/// Leading decimal digits of `raw` as a positive number. Absent, zero or
/// unparsable values yield `default`.
fn lenient_positive(raw: Option<&str>, default: u32) -> u32 {
    raw.map(|raw| {
        let raw = raw.trim_start();
        let end = raw
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(raw.len());
        &raw[..end]
    })
    .and_then(|digits| digits.parse::<u32>().ok())
    .filter(|n| *n > 0)
    .unwrap_or(default)
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

/// `doc_<unix ms>_<9 char suffix>`
fn new_document_id(now: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("doc_{}_{}", now.timestamp_millis(), &suffix[..9])
}

fn estimated_pages(content_length: usize) -> usize {
    content_length.div_ceil(CHARS_PER_PAGE)
}

fn sample_documents() -> Vec<DocumentSummary> {
    vec![
        DocumentSummary {
            id: "doc_sample_1".to_string(),
            title: "Business Plan Draft".to_string(),
            status: "completed".to_string(),
            template: "business-plan".to_string(),
            created_at: "2024-01-01T10:00:00Z".to_string(),
            size: "245 KB".to_string(),
        },
        DocumentSummary {
            id: "doc_sample_2".to_string(),
            title: "Project Proposal".to_string(),
            status: "completed".to_string(),
            template: "proposal".to_string(),
            created_at: "2024-01-01T09:30:00Z".to_string(),
            size: "156 KB".to_string(),
        },
    ]
}

#[utoipa::path(
    post,
    path = "/api/v1/documents/generate",
    tag = "Documents",
    request_body = GenerateDocumentRequest,
    responses(
        (status = 200, description = "Document generated", body = GeneratedDocument),
        (status = 400, description = "Template or content missing", body = ErrorBody)
    )
)]
pub async fn generate_document(
    State(state): State<DocumentsState>,
    ValidatedJson(req): ValidatedJson<GenerateDocumentRequest>,
) -> Json<GeneratedDocument> {
    let started = Instant::now();
    let template = req.template.unwrap_or_default();
    let content = req.content.unwrap_or_default();

    tokio::time::sleep(state.generation_delay).await;

    let created_at = Utc::now();
    let id = new_document_id(created_at);
    // UTF-16 code units, as browsers count string length
    let content_length = content.encode_utf16().count();

    info!(document_id = %id, template = %template, format = %req.format, "📄 Document generated");

    Json(GeneratedDocument {
        download_url: format!("/api/v1/documents/{}/download", id),
        id,
        status: "completed".to_string(),
        template,
        format: req.format,
        created_at,
        metadata: DocumentMetadata {
            content_length,
            estimated_pages: estimated_pages(content_length),
            processing_time: format!("{:.1}s", started.elapsed().as_secs_f64()),
        },
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/documents",
    tag = "Documents",
    params(ListParams),
    responses(
        (status = 200, description = "Page of documents", body = DocumentListResponse)
    )
)]
pub async fn list_documents(Query(params): Query<ListParams>) -> Json<DocumentListResponse> {
    let page = lenient_positive(params.page.as_deref(), 1);
    let limit = lenient_positive(params.limit.as_deref(), DEFAULT_PAGE_SIZE);

    let all = sample_documents();
    let total = all.len();
    let documents = all
        .into_iter()
        .skip((page as usize - 1).saturating_mul(limit as usize))
        .take(limit as usize)
        .collect();

    Json(DocumentListResponse {
        documents,
        total,
        page,
        limit,
        total_pages: (total as u32).div_ceil(limit),
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}/download",
    tag = "Documents",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Placeholder PDF", body = String, content_type = "application/pdf")
    )
)]
pub async fn download_document(Path(id): Path<String>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"document-{}.pdf\"", id),
            ),
        ],
        format!("Mock PDF content for document {}", id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_shape() {
        let now = Utc::now();
        let id = new_document_id(now);
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "doc");
        assert_eq!(parts[1], now.timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 9);
    }

    #[test]
    fn pages_round_up() {
        assert_eq!(estimated_pages(0), 0);
        assert_eq!(estimated_pages(1), 1);
        assert_eq!(estimated_pages(500), 1);
        assert_eq!(estimated_pages(1200), 3);
    }

    #[test]
    fn paging_params_fall_back_leniently() {
        assert_eq!(lenient_positive(None, 10), 10);
        assert_eq!(lenient_positive(Some("3"), 10), 3);
        assert_eq!(lenient_positive(Some("abc"), 1), 1);
        assert_eq!(lenient_positive(Some("0"), 1), 1);
        assert_eq!(lenient_positive(Some("-2"), 1), 1);
        assert_eq!(lenient_positive(Some("2abc"), 1), 2);
        assert_eq!(lenient_positive(Some(""), 10), 10);
    }
}
