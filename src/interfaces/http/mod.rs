//! HTTP REST API interfaces
//!
//! - `common`: response envelopes and the validated JSON extractor
//! - `handlers`: request handlers for hub status, documents and templates
//! - `router`: API router with OpenAPI documentation

pub mod common;
pub mod handlers;
pub mod router;

pub use router::{create_router, ApiDoc, AppState};
