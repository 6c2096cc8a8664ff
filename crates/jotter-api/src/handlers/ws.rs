//! WebSocket upgrade for real-time events.
//!
//! Clients connect to `/ws?token=<jwt>` (browsers cannot set headers on a
//! WebSocket handshake); an `Authorization: Bearer` header is accepted too.
//! The token is validated before the upgrade, so a rejected client is never
//! registered with the hub.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::warn;

use crate::error::ApiError;
use crate::hub::serve_socket;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let token = params
        .token
        .filter(|t| !t.is_empty())
        .or_else(|| {
            headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| t.trim().to_string())
        })
        .ok_or_else(|| ApiError::Unauthorized("Token required".to_string()))?;

    let claims = state.authenticator.validate_token(&token).map_err(|e| {
        warn!(subsystem = "hub", error = %e, "WebSocket upgrade rejected");
        ApiError::from(e)
    })?;

    let hub = state.hub.clone();
    let settings = state.session;
    Ok(ws
        .on_upgrade(move |socket| serve_socket(socket, hub, claims.user_id, settings))
        .into_response())
}
