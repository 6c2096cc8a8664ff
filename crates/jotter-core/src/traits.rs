//! Core traits for jotter abstractions.
//!
//! These traits define the storage and authentication capabilities the
//! mutation pipeline and the real-time hub consume. Every read or write is
//! scoped by the owning user id; absence and foreign ownership both surface as
//! [`Error::NotFound`](crate::Error::NotFound).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Request for creating a new note.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_pinned: Option<bool>,
}

/// Partial update of a note; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub color: Option<String>,
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
    pub position: Option<i32>,
}

impl UpdateNoteRequest {
    /// Apply the provided fields to `note`.
    pub fn apply(&self, note: &mut Note) {
        if let Some(title) = &self.title {
            note.title = title.clone();
        }
        if let Some(content) = &self.content {
            note.content = content.clone();
        }
        if let Some(color) = &self.color {
            note.color = color.clone();
        }
        if let Some(pinned) = self.is_pinned {
            note.is_pinned = pinned;
        }
        if let Some(archived) = self.is_archived {
            note.is_archived = archived;
        }
        if let Some(position) = self.position {
            note.position = position;
        }
    }
}

/// Default listing filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListNotesQuery {
    pub include_archived: bool,
    pub include_deleted: bool,
}

/// Named note views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteView {
    /// Pinned, not archived, not deleted.
    Pinned,
    /// Archived, not deleted.
    Archived,
}

/// Filtered search over a user's non-deleted notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Case-insensitive substring matched against title and content.
    pub text: Option<String>,
    /// Notes carrying any of these labels.
    pub label_ids: Vec<Uuid>,
    /// Exact color match.
    pub color: Option<String>,
    pub include_archived: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Repository for note persistence.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Fetch a note (with labels and attachments) owned by `owner_id`.
    async fn get_note(&self, id: Uuid, owner_id: Uuid) -> Result<Note>;

    /// Insert a new note.
    async fn insert_note(&self, note: &Note) -> Result<()>;

    /// Persist the mutable fields of an existing note and bump `updated_at`.
    async fn save_note(&self, note: &Note) -> Result<()>;

    /// Flip a boolean column in one statement and return the committed note.
    ///
    /// Two concurrent flips on the same row serialize in the store; each
    /// caller observes the value its own flip produced.
    async fn toggle_flag(&self, id: Uuid, owner_id: Uuid, flag: NoteFlag) -> Result<Note>;

    /// Set the color column.
    async fn set_color(&self, id: Uuid, owner_id: Uuid, color: &str) -> Result<()>;

    /// Set the manual ordering rank.
    async fn set_position(&self, id: Uuid, owner_id: Uuid, position: i32) -> Result<()>;

    /// Mark a note deleted while keeping its row.
    async fn soft_delete_note(&self, id: Uuid, owner_id: Uuid) -> Result<()>;

    /// Clear the soft-delete marker.
    async fn restore_note(&self, id: Uuid, owner_id: Uuid) -> Result<()>;

    /// Remove a note and its associations.
    async fn hard_delete_note(&self, id: Uuid, owner_id: Uuid) -> Result<()>;

    /// List notes ordered pinned first, then position, then most recently updated.
    async fn list_notes(&self, owner_id: Uuid, query: ListNotesQuery) -> Result<Vec<Note>>;

    /// Pinned or archived view.
    async fn list_view(&self, owner_id: Uuid, view: NoteView) -> Result<Vec<Note>>;

    /// Filtered search.
    async fn search_notes(&self, owner_id: Uuid, query: &SearchQuery) -> Result<Vec<Note>>;
}

// =============================================================================
// LABEL REPOSITORY
// =============================================================================

/// Request for creating a label.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateLabelRequest {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Partial update of a label.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateLabelRequest {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// Repository for labels and the note/label association.
#[async_trait]
pub trait LabelRepository: Send + Sync {
    /// Fetch a label owned by `owner_id`.
    async fn get_label(&self, id: Uuid, owner_id: Uuid) -> Result<Label>;

    /// Insert a new label.
    async fn insert_label(&self, label: &Label) -> Result<()>;

    /// Persist name and color of an existing label.
    async fn save_label(&self, label: &Label) -> Result<()>;

    /// Delete a label and its associations.
    async fn delete_label(&self, id: Uuid, owner_id: Uuid) -> Result<()>;

    /// Exact (case-sensitive) name lookup within one user's labels.
    async fn find_label_by_name(&self, owner_id: Uuid, name: &str) -> Result<Option<Label>>;

    /// All labels of a user ordered by name.
    async fn list_labels(&self, owner_id: Uuid) -> Result<Vec<Label>>;

    /// Non-deleted notes carrying a label, most recently updated first.
    async fn notes_by_label(&self, label_id: Uuid, owner_id: Uuid) -> Result<Vec<Note>>;

    /// Associate a label with a note. A duplicate attach is a no-op.
    async fn attach_label(&self, note_id: Uuid, label_id: Uuid) -> Result<()>;

    /// Remove an association if present.
    async fn detach_label(&self, note_id: Uuid, label_id: Uuid) -> Result<()>;
}

// =============================================================================
// USER REPOSITORY
// =============================================================================

/// Repository for accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Result<User>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Insert a new account. A taken email is a conflict.
    async fn insert_user(&self, user: &User) -> Result<()>;
}

/// Everything the mutation pipeline needs from storage.
pub trait Store: NoteRepository + LabelRepository + UserRepository {}

impl<T> Store for T where T: NoteRepository + LabelRepository + UserRepository {}

// =============================================================================
// AUTHENTICATION
// =============================================================================

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
}

/// Resolves an access token to its owner.
pub trait Authenticator: Send + Sync {
    /// Validate a token. Any failure is [`Error::Unauthorized`](crate::Error::Unauthorized).
    fn validate_token(&self, token: &str) -> Result<Claims>;
}
