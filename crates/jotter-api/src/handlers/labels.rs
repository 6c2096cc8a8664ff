//! Label routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use jotter_core::{CreateLabelRequest, UpdateLabelRequest};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

pub async fn list_labels(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let labels = state.labels.list(user.user_id).await?;
    Ok(Json(labels))
}

pub async fn create_label(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateLabelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let label = state.labels.create(user.user_id, body).await?;
    Ok((StatusCode::CREATED, Json(label)))
}

pub async fn get_label(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.labels.get(id, user.user_id).await?))
}

pub async fn update_label(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateLabelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let label = state.labels.update(id, user.user_id, body).await?;
    Ok(Json(label))
}

pub async fn delete_label(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.labels.delete(id, user.user_id).await?;
    Ok(Json(serde_json::json!({
        "message": "Label deleted successfully"
    })))
}

pub async fn label_notes(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.labels.notes(id, user.user_id).await?))
}
