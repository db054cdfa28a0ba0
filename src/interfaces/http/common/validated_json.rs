//! Validated JSON extractor for Axum
//!
//! `ValidatedJson<T>` works like `axum::Json<T>`, but additionally runs
//! `validator::Validate::validate()` on the deserialized value.
//! On validation failure it returns a 400 `VALIDATION_ERROR` response whose
//! `details` mark every reported field `valid` or `required`.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use super::ApiError;

/// Request bodies whose fields are individually reported on validation
/// failure.
pub trait ReportedFields {
    const FIELDS: &'static [&'static str];
}

/// An extractor that deserializes JSON and validates it.
///
/// # Usage
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct GenerateRequest {
///     #[validate(required)]
///     template: Option<String>,
/// }
///
/// impl ReportedFields for GenerateRequest {
///     const FIELDS: &'static [&'static str] = &["template"];
/// }
///
/// async fn handler(ValidatedJson(body): ValidatedJson<GenerateRequest>) {
///     // `body` is guaranteed to pass validation
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

/// Error type for `ValidatedJson` extraction failures.
pub enum ValidatedJsonRejection {
    /// JSON parsing failed.
    JsonError(JsonRejection),
    /// Validation failed.
    ValidationError {
        errors: validator::ValidationErrors,
        fields: &'static [&'static str],
    },
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        match self {
            Self::JsonError(rejection) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_JSON",
                format!("Invalid JSON: {}", rejection.body_text()),
            )
            .into_response(),
            Self::ValidationError { errors, fields } => {
                let mut failing: Vec<String> =
                    errors.field_errors().keys().map(|k| k.to_string()).collect();
                failing.sort();

                let mut details: BTreeMap<String, String> = fields
                    .iter()
                    .map(|f| {
                        let verdict = if failing.iter().any(|x| x == f) {
                            "required"
                        } else {
                            "valid"
                        };
                        (f.to_string(), verdict.to_string())
                    })
                    .collect();
                for field in &failing {
                    details
                        .entry(field.clone())
                        .or_insert_with(|| "invalid".to_string());
                }

                let message = if failing.is_empty() {
                    "Validation failed".to_string()
                } else {
                    format!("Missing or empty fields: {}", failing.join(", "))
                };

                ApiError::validation(message, details).into_response()
            }
        }
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + ReportedFields,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(
        req: axum::extract::Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::JsonError)?;

        value
            .validate()
            .map_err(|errors| ValidatedJsonRejection::ValidationError {
                errors,
                fields: T::FIELDS,
            })?;

        Ok(ValidatedJson(value))
    }
}

// ── Tests ──────────────────────────────────────────────────────
