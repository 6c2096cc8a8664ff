//! # jotter-api
//!
//! HTTP API and real-time notification hub for jotter.
//!
//! - [`hub`]: live WebSocket connections and per-user event fan-out
//! - [`services`]: the mutation pipeline (validate, check ownership, write,
//!   read back, dispatch) and accounts
//! - [`handlers`]: thin axum handlers over the services
//!
//! [`build_router`] assembles the full application; the binary adds logging,
//! configuration, and a listener around it.

pub mod config;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod middleware;
pub mod services;
pub mod state;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use uuid::Uuid;

use jotter_core::defaults::ALLOWED_ORIGIN;

pub use config::{AppConfig, StorageKind};
pub use error::ApiError;
pub use state::AppState;

use handlers::{auth, labels, notes, ws};

/// Request ID generator using UUIDv7 for time-ordered request tracing.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// OpenAPI document served at `/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Jotter API",
        description = "Multi-user notes with real-time sync over WebSocket"
    ),
    components(schemas(
        jotter_core::User,
        jotter_core::Note,
        jotter_core::Label,
        jotter_core::Attachment,
        jotter_core::CreateNoteRequest,
        jotter_core::UpdateNoteRequest,
        jotter_core::CreateLabelRequest,
        jotter_core::UpdateLabelRequest,
        services::RegisterRequest,
        services::LoginRequest,
        services::AuthResponse,
        handlers::notes::AdvancedSearchRequest,
        handlers::notes::ColorRequest,
        handlers::notes::PositionRequest,
        handlers::notes::AttachLabelRequest,
    )),
    tags(
        (name = "Notes", description = "Note CRUD, flags, and search"),
        (name = "Labels", description = "Label management"),
        (name = "Auth", description = "Registration and tokens"),
        (name = "System", description = "Health and schema")
    )
)]
pub struct ApiDoc;

/// Parse `ALLOWED_ORIGINS` (comma-separated) into CORS origins.
///
/// Defaults to `http://localhost:3000` when unset or empty. Invalid entries are
/// skipped with a warning.
pub fn parse_allowed_origins(raw: Option<&str>) -> Vec<HeaderValue> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());
    let Some(origins_str) = raw else {
        return vec![HeaderValue::from_static(ALLOWED_ORIGIN)];
    };

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

/// Build the application router.
pub fn build_router(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(handlers::openapi_json))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Notes
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route("/notes/search", get(notes::search_notes))
        .route("/notes/search/advanced", post(notes::advanced_search))
        .route("/notes/pinned", get(notes::pinned_notes))
        .route("/notes/archived", get(notes::archived_notes))
        .route(
            "/notes/:id",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/notes/:id/restore", post(notes::restore_note))
        .route("/notes/:id/pin", patch(notes::toggle_pin))
        .route("/notes/:id/archive", patch(notes::toggle_archive))
        .route("/notes/:id/color", patch(notes::set_color))
        .route("/notes/:id/position", patch(notes::set_position))
        .route("/notes/:id/labels", post(notes::attach_label))
        .route("/notes/:id/labels/:label_id", delete(notes::detach_label))
        // Labels
        .route("/labels", get(labels::list_labels).post(labels::create_label))
        .route(
            "/labels/:id",
            get(labels::get_label)
                .put(labels::update_label)
                .delete(labels::delete_label),
        )
        .route("/labels/:id/notes", get(labels::label_notes))
        // Real-time events
        .route("/ws", get(ws::ws_handler))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allowed_origins() {
        assert_eq!(
            parse_allowed_origins(None),
            vec![HeaderValue::from_static("http://localhost:3000")]
        );
        assert_eq!(
            parse_allowed_origins(Some("https://a.example, ,https://b.example")),
            vec![
                HeaderValue::from_static("https://a.example"),
                HeaderValue::from_static("https://b.example"),
            ]
        );
    }

    #[test]
    fn test_openapi_lists_note_schema() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.schemas.contains_key("Note"));
        assert!(components.schemas.contains_key("Label"));
    }
}
