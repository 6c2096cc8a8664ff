//! In-process store for tests and local development.
//!
//! [`MemoryStore`] implements every repository trait against maps behind a
//! single mutex, with the same ordering, ownership scoping, and uniqueness
//! rules as the PostgreSQL repositories. Each trait call takes the lock once,
//! so a toggle is as atomic here as the `NOT column` update is in SQL.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use jotter_db::memory::MemoryStore;
//!
//! let store = MemoryStore::new();
//! let user = User::new_local("ada@example.com", "Ada", "hash");
//! store.insert_user(&user).await?;
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use jotter_core::{
    Attachment, Error, Label, LabelRepository, ListNotesQuery, Note, NoteFlag, NoteRepository,
    NoteView, Result, SearchQuery, User, UserRepository,
};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    notes: HashMap<Uuid, Note>,
    labels: HashMap<Uuid, Label>,
    /// (note_id, label_id)
    note_labels: BTreeSet<(Uuid, Uuid)>,
    attachments: Vec<Attachment>,
}

impl State {
    fn owned_note_mut(&mut self, id: Uuid, owner_id: Uuid) -> Result<&mut Note> {
        self.notes
            .get_mut(&id)
            .filter(|n| n.user_id == owner_id)
            .ok_or_else(|| Error::note_not_found(id))
    }

    /// Clone a note with its labels filled in, ordered by name.
    fn hydrate(&self, note: &Note) -> Note {
        let mut out = note.clone();
        let mut labels: Vec<Label> = self
            .note_labels
            .iter()
            .filter(|(n, _)| *n == note.id)
            .filter_map(|(_, l)| self.labels.get(l).cloned())
            .collect();
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        out.labels = labels;
        out
    }

    fn hydrate_all<'a>(&self, notes: impl Iterator<Item = &'a Note>) -> Vec<Note> {
        notes.map(|n| self.hydrate(n)).collect()
    }
}

/// Mutex-guarded in-memory implementation of all repository traits.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with [`Error::Internal`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Add an attachment row for a note.
    pub fn add_attachment(&self, attachment: Attachment) {
        self.state().attachments.push(attachment);
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock for a write, honoring injected failures.
    fn write(&self) -> Result<MutexGuard<'_, State>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Internal("store write failed".to_string()));
        }
        Ok(self.state())
    }
}

#[async_trait]
impl NoteRepository for MemoryStore {
    async fn get_note(&self, id: Uuid, owner_id: Uuid) -> Result<Note> {
        let state = self.state();
        let note = state
            .notes
            .get(&id)
            .filter(|n| n.user_id == owner_id)
            .ok_or_else(|| Error::note_not_found(id))?;
        let mut note = state.hydrate(note);
        note.attachments = state
            .attachments
            .iter()
            .filter(|a| a.note_id == id)
            .cloned()
            .collect();
        Ok(note)
    }

    async fn insert_note(&self, note: &Note) -> Result<()> {
        let mut state = self.write()?;
        if !state.users.contains_key(&note.user_id) {
            return Err(Error::user_not_found(note.user_id));
        }
        if state.notes.contains_key(&note.id) {
            return Err(Error::Conflict(format!("note {} already exists", note.id)));
        }
        let mut stored = note.clone();
        stored.labels.clear();
        stored.attachments.clear();
        state.notes.insert(note.id, stored);
        Ok(())
    }

    async fn save_note(&self, note: &Note) -> Result<()> {
        let mut state = self.write()?;
        let stored = state.owned_note_mut(note.id, note.user_id)?;
        stored.title = note.title.clone();
        stored.content = note.content.clone();
        stored.color = note.color.clone();
        stored.is_pinned = note.is_pinned;
        stored.is_archived = note.is_archived;
        stored.position = note.position;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn toggle_flag(&self, id: Uuid, owner_id: Uuid, flag: NoteFlag) -> Result<Note> {
        let mut state = self.write()?;
        let stored = state.owned_note_mut(id, owner_id)?;
        match flag {
            NoteFlag::Pinned => stored.is_pinned = !stored.is_pinned,
            NoteFlag::Archived => stored.is_archived = !stored.is_archived,
        }
        stored.updated_at = Utc::now();
        let snapshot = stored.clone();
        Ok(state.hydrate(&snapshot))
    }

    async fn set_color(&self, id: Uuid, owner_id: Uuid, color: &str) -> Result<()> {
        let mut state = self.write()?;
        let stored = state.owned_note_mut(id, owner_id)?;
        stored.color = color.to_string();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn set_position(&self, id: Uuid, owner_id: Uuid, position: i32) -> Result<()> {
        let mut state = self.write()?;
        let stored = state.owned_note_mut(id, owner_id)?;
        stored.position = position;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn soft_delete_note(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        let mut state = self.write()?;
        let stored = state.owned_note_mut(id, owner_id)?;
        stored.is_deleted = true;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn restore_note(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        let mut state = self.write()?;
        let stored = state.owned_note_mut(id, owner_id)?;
        stored.is_deleted = false;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn hard_delete_note(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        let mut state = self.write()?;
        state.owned_note_mut(id, owner_id)?;
        state.notes.remove(&id);
        state.note_labels.retain(|(n, _)| *n != id);
        state.attachments.retain(|a| a.note_id != id);
        Ok(())
    }

    async fn list_notes(&self, owner_id: Uuid, query: ListNotesQuery) -> Result<Vec<Note>> {
        let state = self.state();
        let mut notes: Vec<&Note> = state
            .notes
            .values()
            .filter(|n| n.user_id == owner_id)
            .filter(|n| query.include_archived || !n.is_archived)
            .filter(|n| query.include_deleted || !n.is_deleted)
            .collect();
        notes.sort_by(|a, b| {
            b.is_pinned
                .cmp(&a.is_pinned)
                .then(a.position.cmp(&b.position))
                .then(b.updated_at.cmp(&a.updated_at))
        });
        Ok(state.hydrate_all(notes.into_iter()))
    }

    async fn list_view(&self, owner_id: Uuid, view: NoteView) -> Result<Vec<Note>> {
        let state = self.state();
        let mut notes: Vec<&Note> = state
            .notes
            .values()
            .filter(|n| n.user_id == owner_id && !n.is_deleted)
            .filter(|n| match view {
                NoteView::Pinned => n.is_pinned && !n.is_archived,
                NoteView::Archived => n.is_archived,
            })
            .collect();
        match view {
            NoteView::Pinned => notes.sort_by(|a, b| {
                a.position
                    .cmp(&b.position)
                    .then(b.updated_at.cmp(&a.updated_at))
            }),
            NoteView::Archived => notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        }
        Ok(state.hydrate_all(notes.into_iter()))
    }

    async fn search_notes(&self, owner_id: Uuid, query: &SearchQuery) -> Result<Vec<Note>> {
        let state = self.state();
        let needle = query
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        let mut notes: Vec<&Note> = state
            .notes
            .values()
            .filter(|n| n.user_id == owner_id && !n.is_deleted)
            .filter(|n| query.include_archived || !n.is_archived)
            .filter(|n| match &needle {
                Some(t) => n.title.to_lowercase().contains(t) || n.content.to_lowercase().contains(t),
                None => true,
            })
            .filter(|n| query.color.as_ref().map_or(true, |c| &n.color == c))
            .filter(|n| {
                query.label_ids.is_empty()
                    || query
                        .label_ids
                        .iter()
                        .any(|l| state.note_labels.contains(&(n.id, *l)))
            })
            .collect();
        notes.sort_by(|a, b| {
            b.is_pinned
                .cmp(&a.is_pinned)
                .then(b.updated_at.cmp(&a.updated_at))
        });

        let offset = query.offset.unwrap_or(0).max(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |l| l.max(0) as usize);
        Ok(state.hydrate_all(notes.into_iter().skip(offset).take(limit)))
    }
}

#[async_trait]
impl LabelRepository for MemoryStore {
    async fn get_label(&self, id: Uuid, owner_id: Uuid) -> Result<Label> {
        self.state()
            .labels
            .get(&id)
            .filter(|l| l.user_id == owner_id)
            .cloned()
            .ok_or_else(|| Error::label_not_found(id))
    }

    async fn insert_label(&self, label: &Label) -> Result<()> {
        let mut state = self.write()?;
        if !state.users.contains_key(&label.user_id) {
            return Err(Error::user_not_found(label.user_id));
        }
        let taken = state
            .labels
            .values()
            .any(|l| l.user_id == label.user_id && l.name == label.name);
        if taken {
            return Err(Error::Conflict(
                "label with this name already exists".to_string(),
            ));
        }
        state.labels.insert(label.id, label.clone());
        Ok(())
    }

    async fn save_label(&self, label: &Label) -> Result<()> {
        let mut state = self.write()?;
        let taken = state
            .labels
            .values()
            .any(|l| l.user_id == label.user_id && l.name == label.name && l.id != label.id);
        if taken {
            return Err(Error::Conflict(
                "label with this name already exists".to_string(),
            ));
        }
        let stored = state
            .labels
            .get_mut(&label.id)
            .filter(|l| l.user_id == label.user_id)
            .ok_or_else(|| Error::label_not_found(label.id))?;
        stored.name = label.name.clone();
        stored.color = label.color.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_label(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        let mut state = self.write()?;
        let owned = state.labels.get(&id).is_some_and(|l| l.user_id == owner_id);
        if !owned {
            return Err(Error::label_not_found(id));
        }
        state.labels.remove(&id);
        state.note_labels.retain(|(_, l)| *l != id);
        Ok(())
    }

    async fn find_label_by_name(&self, owner_id: Uuid, name: &str) -> Result<Option<Label>> {
        Ok(self
            .state()
            .labels
            .values()
            .find(|l| l.user_id == owner_id && l.name == name)
            .cloned())
    }

    async fn list_labels(&self, owner_id: Uuid) -> Result<Vec<Label>> {
        let mut labels: Vec<Label> = self
            .state()
            .labels
            .values()
            .filter(|l| l.user_id == owner_id)
            .cloned()
            .collect();
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(labels)
    }

    async fn notes_by_label(&self, label_id: Uuid, owner_id: Uuid) -> Result<Vec<Note>> {
        let state = self.state();
        let mut notes: Vec<&Note> = state
            .note_labels
            .iter()
            .filter(|(_, l)| *l == label_id)
            .filter_map(|(n, _)| state.notes.get(n))
            .filter(|n| n.user_id == owner_id && !n.is_deleted)
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(state.hydrate_all(notes.into_iter()))
    }

    async fn attach_label(&self, note_id: Uuid, label_id: Uuid) -> Result<()> {
        let mut state = self.write()?;
        if !state.notes.contains_key(&note_id) {
            return Err(Error::note_not_found(note_id));
        }
        if !state.labels.contains_key(&label_id) {
            return Err(Error::label_not_found(label_id));
        }
        state.note_labels.insert((note_id, label_id));
        Ok(())
    }

    async fn detach_label(&self, note_id: Uuid, label_id: Uuid) -> Result<()> {
        let mut state = self.write()?;
        state.note_labels.remove(&(note_id, label_id));
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get_user(&self, id: Uuid) -> Result<User> {
        self.state()
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::user_not_found(id))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .state()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut state = self.write()?;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(Error::Conflict(
                "user with this email already exists".to_string(),
            ));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }
}
