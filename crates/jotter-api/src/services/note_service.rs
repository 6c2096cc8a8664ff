//! Note mutations and reads.
//!
//! Every mutation follows the same pipeline: ownership check, one durable
//! write, read-back of the committed note, then dispatch to the owner's live
//! sessions. Any failure returns before the dispatch.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use jotter_core::defaults::{DEFAULT_COLOR, SEARCH_LIMIT};
use jotter_core::validation::{
    validate_create_note, validate_label_filter_count, validate_note_color, validate_pagination,
    validate_position, validate_search_text, validate_update_note,
};
use jotter_core::{
    CreateNoteRequest, Error, Event, ListNotesQuery, Note, NoteFlag, NoteView, Result, SearchQuery,
    Store, UpdateNoteRequest,
};

use crate::hub::Hub;

/// Filters for the advanced search endpoint.
#[derive(Debug, Clone, Default)]
pub struct AdvancedSearch {
    pub query: String,
    pub label_ids: Vec<Uuid>,
    pub color: Option<String>,
    pub include_archived: bool,
}

#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn Store>,
    hub: Arc<Hub>,
}

impl NoteService {
    pub fn new(store: Arc<dyn Store>, hub: Arc<Hub>) -> Self {
        Self { store, hub }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn create(&self, owner_id: Uuid, req: CreateNoteRequest) -> Result<Note> {
        validate_create_note(&req)?;
        self.store.get_user(owner_id).await?;

        let mut note = Note::new(owner_id, req.title, req.content);
        note.color = normalize_color(req.color);
        note.is_pinned = req.is_pinned.unwrap_or(false);
        self.store.insert_note(&note).await?;

        let note = self.read_back(note.id, owner_id, "create").await?;
        info!(
            subsystem = "api",
            component = "note_service",
            op = "create",
            user_id = %owner_id,
            note_id = %note.id,
            "Note created"
        );
        self.hub.dispatch(owner_id, &Event::NoteCreated(note.clone()));
        Ok(note)
    }

    pub async fn update(&self, id: Uuid, owner_id: Uuid, req: UpdateNoteRequest) -> Result<Note> {
        validate_update_note(&req)?;
        let mut note = self.store.get_note(id, owner_id).await?;
        req.apply(&mut note);
        if note.color.is_empty() {
            note.color = DEFAULT_COLOR.to_string();
        }
        self.store.save_note(&note).await?;
        self.updated(id, owner_id, "update").await
    }

    /// Flip `is_pinned`. The returned note is the state committed by this toggle.
    pub async fn toggle_pin(&self, id: Uuid, owner_id: Uuid) -> Result<Note> {
        self.toggle(id, owner_id, NoteFlag::Pinned).await
    }

    /// Flip `is_archived`.
    pub async fn toggle_archive(&self, id: Uuid, owner_id: Uuid) -> Result<Note> {
        self.toggle(id, owner_id, NoteFlag::Archived).await
    }

    async fn toggle(&self, id: Uuid, owner_id: Uuid, flag: NoteFlag) -> Result<Note> {
        // Ownership is re-checked inside the store statement; this read keeps
        // the error path identical to the other mutations.
        self.store.get_note(id, owner_id).await?;
        let note = self.store.toggle_flag(id, owner_id, flag).await?;
        debug!(
            subsystem = "api",
            component = "note_service",
            op = "toggle",
            user_id = %owner_id,
            note_id = %id,
            flag = flag.column(),
            value = note.flag(flag),
            "Note flag toggled"
        );
        self.hub.dispatch(owner_id, &Event::NoteUpdated(note.clone()));
        Ok(note)
    }

    /// Set the color; the empty string resets to the default.
    pub async fn set_color(&self, id: Uuid, owner_id: Uuid, color: &str) -> Result<Note> {
        validate_note_color(color)?;
        let color = if color.is_empty() { DEFAULT_COLOR } else { color };
        self.store.get_note(id, owner_id).await?;
        self.store.set_color(id, owner_id, color).await?;
        self.updated(id, owner_id, "set_color").await
    }

    pub async fn set_position(&self, id: Uuid, owner_id: Uuid, position: i32) -> Result<Note> {
        validate_position(position)?;
        self.store.get_note(id, owner_id).await?;
        self.store.set_position(id, owner_id, position).await?;
        self.updated(id, owner_id, "set_position").await
    }

    /// Soft delete by default; `permanent` removes the row and its associations.
    pub async fn delete(&self, id: Uuid, owner_id: Uuid, permanent: bool) -> Result<()> {
        self.store.get_note(id, owner_id).await?;
        if permanent {
            self.store.hard_delete_note(id, owner_id).await?;
        } else {
            self.store.soft_delete_note(id, owner_id).await?;
        }
        info!(
            subsystem = "api",
            component = "note_service",
            op = "delete",
            user_id = %owner_id,
            note_id = %id,
            permanent,
            "Note deleted"
        );
        self.hub.dispatch(owner_id, &Event::note_deleted(id));
        Ok(())
    }

    /// Undo a soft delete.
    pub async fn restore(&self, id: Uuid, owner_id: Uuid) -> Result<Note> {
        self.store.get_note(id, owner_id).await?;
        self.store.restore_note(id, owner_id).await?;
        self.updated(id, owner_id, "restore").await
    }

    /// Attach a label. Both entities must belong to `owner_id`; attaching an
    /// already-attached label succeeds and still reports the note.
    pub async fn attach_label(&self, id: Uuid, label_id: Uuid, owner_id: Uuid) -> Result<Note> {
        self.store.get_note(id, owner_id).await?;
        self.store.get_label(label_id, owner_id).await?;
        self.store.attach_label(id, label_id).await?;
        debug!(
            subsystem = "api",
            component = "note_service",
            op = "attach_label",
            user_id = %owner_id,
            note_id = %id,
            label_id = %label_id,
            "Label attached"
        );
        self.updated(id, owner_id, "attach_label").await
    }

    pub async fn detach_label(&self, id: Uuid, label_id: Uuid, owner_id: Uuid) -> Result<Note> {
        self.store.get_note(id, owner_id).await?;
        self.store.get_label(label_id, owner_id).await?;
        self.store.detach_label(id, label_id).await?;
        self.updated(id, owner_id, "detach_label").await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get(&self, id: Uuid, owner_id: Uuid) -> Result<Note> {
        self.store.get_note(id, owner_id).await
    }

    pub async fn list(&self, owner_id: Uuid, query: ListNotesQuery) -> Result<Vec<Note>> {
        self.store.list_notes(owner_id, query).await
    }

    pub async fn pinned(&self, owner_id: Uuid) -> Result<Vec<Note>> {
        self.store.list_view(owner_id, NoteView::Pinned).await
    }

    pub async fn archived(&self, owner_id: Uuid) -> Result<Vec<Note>> {
        self.store.list_view(owner_id, NoteView::Archived).await
    }

    /// Substring search over title and content. `limit == 0` means the default
    /// page size; `page` is zero-based.
    pub async fn search(
        &self,
        owner_id: Uuid,
        text: &str,
        limit: i64,
        page: i64,
    ) -> Result<Vec<Note>> {
        validate_search_text(text)?;
        validate_pagination(limit, page)?;
        let limit = if limit == 0 { SEARCH_LIMIT } else { limit };
        let offset = page
            .checked_mul(limit)
            .ok_or_else(|| Error::InvalidInput("page is out of range".to_string()))?;

        let query = SearchQuery {
            text: Some(text.to_string()).filter(|t| !t.trim().is_empty()),
            include_archived: true,
            limit: Some(limit),
            offset: Some(offset),
            ..Default::default()
        };
        let notes = self.store.search_notes(owner_id, &query).await?;
        debug!(
            subsystem = "api",
            component = "note_service",
            op = "search",
            user_id = %owner_id,
            result_count = notes.len(),
            "Search complete"
        );
        Ok(notes)
    }

    pub async fn advanced_search(&self, owner_id: Uuid, req: AdvancedSearch) -> Result<Vec<Note>> {
        validate_search_text(&req.query)?;
        validate_label_filter_count(req.label_ids.len())?;
        let color = req.color.filter(|c| !c.is_empty());
        if let Some(color) = &color {
            validate_note_color(color)?;
        }

        let query = SearchQuery {
            text: Some(req.query).filter(|t| !t.trim().is_empty()),
            label_ids: req.label_ids,
            color,
            include_archived: req.include_archived,
            limit: None,
            offset: None,
        };
        self.store.search_notes(owner_id, &query).await
    }

    // =========================================================================
    // Pipeline helpers
    // =========================================================================

    /// Re-fetch after a committed write. A failure here skips the dispatch;
    /// the write stands and clients converge on their next fetch.
    async fn read_back(&self, id: Uuid, owner_id: Uuid, op: &'static str) -> Result<Note> {
        self.store.get_note(id, owner_id).await.map_err(|e| {
            warn!(
                subsystem = "api",
                component = "note_service",
                op,
                user_id = %owner_id,
                note_id = %id,
                error = %e,
                "Read-back after write failed, event not dispatched"
            );
            e
        })
    }

    async fn updated(&self, id: Uuid, owner_id: Uuid, op: &'static str) -> Result<Note> {
        let note = self.read_back(id, owner_id, op).await?;
        self.hub.dispatch(owner_id, &Event::NoteUpdated(note.clone()));
        Ok(note)
    }
}

fn normalize_color(color: Option<String>) -> String {
    color
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_COLOR.to_string())
}
