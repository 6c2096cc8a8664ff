//! # jotter-db
//!
//! Storage layer for jotter.
//!
//! This crate provides:
//! - Connection pool setup sized from server configuration
//! - PostgreSQL repositories for users, notes, labels, and note/label links
//! - Embedded schema migrations
//! - [`memory::MemoryStore`], an in-process store with the same semantics
//!
//! ## Example
//!
//! ```rust,ignore
//! use jotter_db::{Database, NoteRepository, Note, PoolConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect_with_config("postgres://localhost/jotter", PoolConfig::new()).await?;
//!     db.migrate().await?;
//!
//!     let note = Note::new(user_id, "Groceries", "milk, eggs");
//!     db.insert_note(&note).await?;
//!     Ok(())
//! }
//! ```
pub mod labels;
pub mod memory;
pub mod notes;
pub mod pool;
pub mod users;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

use async_trait::async_trait;
use uuid::Uuid;

// Re-export core types
pub use jotter_core::*;

pub use labels::PgLabelRepository;
pub use memory::MemoryStore;
pub use notes::PgNoteRepository;
pub use pool::{connect_pool, PoolConfig, PoolStatus};
pub use users::PgUserRepository;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Map a unique-constraint violation to [`Error::Conflict`]; pass anything else through.
pub(crate) fn map_unique_violation(err: sqlx::Error, msg: &str) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => Error::Conflict(msg.to_string()),
        _ => Error::Database(err),
    }
}

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub notes: PgNoteRepository,
    pub labels: PgLabelRepository,
    pub users: PgUserRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            labels: PgLabelRepository::new(pool.clone()),
            users: PgUserRepository::new(pool.clone()),
            pool,
        }
    }

    /// Open a pool and wire the repositories around it.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = connect_pool(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

// The pipeline talks to a single `Store`; the database forwards each call to
// the repository that owns the table.

#[async_trait]
impl NoteRepository for Database {
    async fn get_note(&self, id: Uuid, owner_id: Uuid) -> Result<Note> {
        self.notes.get_note(id, owner_id).await
    }

    async fn insert_note(&self, note: &Note) -> Result<()> {
        self.notes.insert_note(note).await
    }

    async fn save_note(&self, note: &Note) -> Result<()> {
        self.notes.save_note(note).await
    }

    async fn toggle_flag(&self, id: Uuid, owner_id: Uuid, flag: NoteFlag) -> Result<Note> {
        self.notes.toggle_flag(id, owner_id, flag).await
    }

    async fn set_color(&self, id: Uuid, owner_id: Uuid, color: &str) -> Result<()> {
        self.notes.set_color(id, owner_id, color).await
    }

    async fn set_position(&self, id: Uuid, owner_id: Uuid, position: i32) -> Result<()> {
        self.notes.set_position(id, owner_id, position).await
    }

    async fn soft_delete_note(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        self.notes.soft_delete_note(id, owner_id).await
    }

    async fn restore_note(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        self.notes.restore_note(id, owner_id).await
    }

    async fn hard_delete_note(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        self.notes.hard_delete_note(id, owner_id).await
    }

    async fn list_notes(&self, owner_id: Uuid, query: ListNotesQuery) -> Result<Vec<Note>> {
        self.notes.list_notes(owner_id, query).await
    }

    async fn list_view(&self, owner_id: Uuid, view: NoteView) -> Result<Vec<Note>> {
        self.notes.list_view(owner_id, view).await
    }

    async fn search_notes(&self, owner_id: Uuid, query: &SearchQuery) -> Result<Vec<Note>> {
        self.notes.search_notes(owner_id, query).await
    }
}

#[async_trait]
impl LabelRepository for Database {
    async fn get_label(&self, id: Uuid, owner_id: Uuid) -> Result<Label> {
        self.labels.get_label(id, owner_id).await
    }

    async fn insert_label(&self, label: &Label) -> Result<()> {
        self.labels.insert_label(label).await
    }

    async fn save_label(&self, label: &Label) -> Result<()> {
        self.labels.save_label(label).await
    }

    async fn delete_label(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        self.labels.delete_label(id, owner_id).await
    }

    async fn find_label_by_name(&self, owner_id: Uuid, name: &str) -> Result<Option<Label>> {
        self.labels.find_label_by_name(owner_id, name).await
    }

    async fn list_labels(&self, owner_id: Uuid) -> Result<Vec<Label>> {
        self.labels.list_labels(owner_id).await
    }

    async fn notes_by_label(&self, label_id: Uuid, owner_id: Uuid) -> Result<Vec<Note>> {
        self.labels.notes_by_label(label_id, owner_id).await
    }

    async fn attach_label(&self, note_id: Uuid, label_id: Uuid) -> Result<()> {
        self.labels.attach_label(note_id, label_id).await
    }

    async fn detach_label(&self, note_id: Uuid, label_id: Uuid) -> Result<()> {
        self.labels.detach_label(note_id, label_id).await
    }
}

#[async_trait]
impl UserRepository for Database {
    async fn get_user(&self, id: Uuid) -> Result<User> {
        self.users.get_user(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.users.get_user_by_email(email).await
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        self.users.insert_user(user).await
    }
}
