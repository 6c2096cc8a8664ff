//! Account routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::{LoginRequest, RegisterRequest};
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.auth.register(body).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.auth.login(body).await?))
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout(_user: AuthUser) -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Logged out successfully"
    }))
}

pub async fn me(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.auth.me(user.user_id).await?))
}
