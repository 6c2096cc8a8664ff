//! Note routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use jotter_core::{CreateNoteRequest, ListNotesQuery, UpdateNoteRequest};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::AdvancedSearch;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub page: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub permanent: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdvancedSearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub label_ids: Vec<Uuid>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ColorRequest {
    pub color: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PositionRequest {
    pub position: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttachLabelRequest {
    pub label_id: Uuid,
}

pub async fn list_notes(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = ListNotesQuery {
        include_archived: params.archived,
        include_deleted: params.deleted,
    };
    let notes = state.notes.list(user.user_id, query).await?;
    Ok(Json(notes))
}

pub async fn create_note(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.notes.create(user.user_id, body).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn get_note(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.notes.get(id, user.user_id).await?;
    Ok(Json(note))
}

pub async fn update_note(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.notes.update(id, user.user_id, body).await?;
    Ok(Json(note))
}

pub async fn delete_note(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .notes
        .delete(id, user.user_id, params.permanent)
        .await?;
    Ok(Json(serde_json::json!({
        "message": "Note deleted successfully"
    })))
}

pub async fn restore_note(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.notes.restore(id, user.user_id).await?;
    Ok(Json(note))
}

pub async fn toggle_pin(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.notes.toggle_pin(id, user.user_id).await?;
    Ok(Json(note))
}

pub async fn toggle_archive(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.notes.toggle_archive(id, user.user_id).await?;
    Ok(Json(note))
}

pub async fn set_color(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ColorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.notes.set_color(id, user.user_id, &body.color).await?;
    Ok(Json(note))
}

pub async fn set_position(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PositionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state
        .notes
        .set_position(id, user.user_id, body.position)
        .await?;
    Ok(Json(note))
}

pub async fn attach_label(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<AttachLabelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state
        .notes
        .attach_label(id, body.label_id, user.user_id)
        .await?;
    Ok(Json(note))
}

pub async fn detach_label(
    user: AuthUser,
    State(state): State<AppState>,
    Path((id, label_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state
        .notes
        .detach_label(id, label_id, user.user_id)
        .await?;
    Ok(Json(note))
}

pub async fn search_notes(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let notes = state
        .notes
        .search(user.user_id, &params.q, params.limit, params.page)
        .await?;
    Ok(Json(notes))
}

pub async fn advanced_search(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<AdvancedSearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let req = AdvancedSearch {
        query: body.query,
        label_ids: body.label_ids,
        color: body.color,
        include_archived: body.include_archived,
    };
    let notes = state.notes.advanced_search(user.user_id, req).await?;
    Ok(Json(notes))
}

pub async fn pinned_notes(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.notes.pinned(user.user_id).await?))
}

pub async fn archived_notes(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.notes.archived(user.user_id).await?))
}
