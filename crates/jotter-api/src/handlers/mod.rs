//! HTTP handlers, grouped by resource.

pub mod auth;
pub mod labels;
pub mod notes;
pub mod ws;

use axum::response::IntoResponse;
use axum::Json;
use utoipa::OpenApi;

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn openapi_json() -> impl IntoResponse {
    Json(crate::ApiDoc::openapi())
}
