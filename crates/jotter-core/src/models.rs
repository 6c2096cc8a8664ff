//! Core data models for jotter.
//!
//! These types are shared across all jotter crates and are also the JSON
//! representation served over HTTP and carried in real-time event payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::{DEFAULT_COLOR, LOCAL_PROVIDER};
use crate::uuid_utils::new_v7;

// =============================================================================
// USER
// =============================================================================

/// An account. Identity root for notes and labels.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Password hash (PHC string). Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub name: String,
    pub avatar: Option<String>,
    /// `local` for email/password accounts.
    pub provider: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a new local account ready to insert.
    pub fn new_local(
        email: impl Into<String>,
        name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_v7(),
            email: email.into(),
            password_hash: password_hash.into(),
            name: name.into(),
            avatar: None,
            provider: LOCAL_PROVIDER.to_string(),
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// NOTE
// =============================================================================

/// A note. `user_id` never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub color: String,
    pub is_pinned: bool,
    pub is_archived: bool,
    /// Soft-delete marker.
    pub is_deleted: bool,
    /// Manual ordering rank, lower sorts first.
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Labels attached through `note_labels`.
    #[sqlx(skip)]
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Attachments; populated on single-note reads only.
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Note {
    /// Build a new note owned by `user_id` with default flags.
    pub fn new(user_id: Uuid, title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_v7(),
            user_id,
            title: title.into(),
            content: content.into(),
            color: DEFAULT_COLOR.to_string(),
            is_pinned: false,
            is_archived: false,
            is_deleted: false,
            position: 0,
            created_at: now,
            updated_at: now,
            labels: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Current value of a boolean flag.
    pub fn flag(&self, flag: NoteFlag) -> bool {
        match flag {
            NoteFlag::Pinned => self.is_pinned,
            NoteFlag::Archived => self.is_archived,
        }
    }
}

/// Boolean note columns that can be flipped atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteFlag {
    Pinned,
    Archived,
}

impl NoteFlag {
    /// Database column backing this flag.
    pub fn column(self) -> &'static str {
        match self {
            NoteFlag::Pinned => "is_pinned",
            NoteFlag::Archived => "is_archived",
        }
    }
}

// =============================================================================
// LABEL
// =============================================================================

/// A user-defined label. `(user_id, name)` is unique; names are stored trimmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Label {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Label {
    /// Build a new label; the name is trimmed.
    pub fn new(user_id: Uuid, name: &str, color: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_v7(),
            user_id,
            name: name.trim().to_string(),
            color: color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Association row between a note and a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct NoteLabel {
    pub note_id: Uuid,
    pub label_id: Uuid,
}

// =============================================================================
// ATTACHMENT
// =============================================================================

/// File attached to a note. Stored and served elsewhere; read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Attachment {
    pub id: Uuid,
    pub note_id: Uuid,
    pub filename: String,
    pub url: String,
    pub size: i64,
    pub mime_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_defaults() {
        let user = Uuid::new_v4();
        let note = Note::new(user, "Groceries", "milk");
        assert_eq!(note.user_id, user);
        assert_eq!(note.color, DEFAULT_COLOR);
        assert!(!note.is_pinned && !note.is_archived && !note.is_deleted);
        assert_eq!(note.position, 0);
        assert!(note.labels.is_empty());
    }

    #[test]
    fn test_label_name_is_trimmed() {
        let label = Label::new(Uuid::new_v4(), "  Work \t", None);
        assert_eq!(label.name, "Work");
        assert_eq!(label.color, DEFAULT_COLOR);
    }

    #[test]
    fn test_user_password_hash_not_serialized() {
        let user = User::new_local("a@example.com", "Ada", "$argon2id$secret");
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["provider"], "local");
    }

    #[test]
    fn test_note_flag_accessor() {
        let mut note = Note::new(Uuid::new_v4(), "t", "c");
        note.is_archived = true;
        assert!(!note.flag(NoteFlag::Pinned));
        assert!(note.flag(NoteFlag::Archived));
        assert_eq!(NoteFlag::Pinned.column(), "is_pinned");
    }

    #[test]
    fn test_note_serializes_labels_but_omits_empty_attachments() {
        let note = Note::new(Uuid::new_v4(), "t", "c");
        let json = serde_json::to_value(&note).unwrap();
        assert!(json["labels"].as_array().unwrap().is_empty());
        assert!(json.get("attachments").is_none());
    }
}
