//! Note repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use jotter_core::{
    Attachment, Error, ListNotesQuery, Note, NoteFlag, NoteRepository, NoteView, Result,
    SearchQuery,
};

use crate::escape_like;
use crate::labels::labels_for_notes;

pub(crate) const NOTE_COLUMNS: &str = "n.id, n.user_id, n.title, n.content, n.color, \
     n.is_pinned, n.is_archived, n.is_deleted, n.position, n.created_at, n.updated_at";

/// PostgreSQL implementation of NoteRepository.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Attach labels to each note with a single query.
    async fn with_labels(&self, mut notes: Vec<Note>) -> Result<Vec<Note>> {
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        fill_labels(&mut *conn, &mut notes).await?;
        Ok(notes)
    }

    async fn attachments_for(&self, note_id: Uuid) -> Result<Vec<Attachment>> {
        sqlx::query_as::<_, Attachment>(
            "SELECT id, note_id, filename, url, size, mime_type, created_at
             FROM attachments WHERE note_id = $1 ORDER BY created_at",
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }

    /// Run an owner-scoped statement; zero affected rows is not-found.
    async fn execute_owned(&self, sql: &str, id: Uuid, owner_id: Uuid) -> Result<()> {
        let result = sqlx::query(sql)
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::note_not_found(id));
        }
        Ok(())
    }
}

pub(crate) async fn fill_labels(conn: &mut PgConnection, notes: &mut [Note]) -> Result<()> {
    if notes.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = notes.iter().map(|n| n.id).collect();
    let mut by_note: HashMap<Uuid, Vec<_>> = labels_for_notes(conn, &ids).await?;
    for note in notes.iter_mut() {
        note.labels = by_note.remove(&note.id).unwrap_or_default();
    }
    Ok(())
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn get_note(&self, id: Uuid, owner_id: Uuid) -> Result<Note> {
        let note = sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes n WHERE n.id = $1 AND n.user_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::note_not_found(id))?;

        let mut notes = self.with_labels(vec![note]).await?;
        let mut note = notes.remove(0);
        note.attachments = self.attachments_for(id).await?;
        Ok(note)
    }

    async fn insert_note(&self, note: &Note) -> Result<()> {
        sqlx::query(
            "INSERT INTO notes (id, user_id, title, content, color, is_pinned, is_archived,
                                is_deleted, position, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(note.id)
        .bind(note.user_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.color)
        .bind(note.is_pinned)
        .bind(note.is_archived)
        .bind(note.is_deleted)
        .bind(note.position)
        .bind(note.created_at)
        .bind(note.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn save_note(&self, note: &Note) -> Result<()> {
        let result = sqlx::query(
            "UPDATE notes
             SET title = $3, content = $4, color = $5, is_pinned = $6, is_archived = $7,
                 position = $8, updated_at = $9
             WHERE id = $1 AND user_id = $2",
        )
        .bind(note.id)
        .bind(note.user_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.color)
        .bind(note.is_pinned)
        .bind(note.is_archived)
        .bind(note.position)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::note_not_found(note.id));
        }
        Ok(())
    }

    async fn toggle_flag(&self, id: Uuid, owner_id: Uuid, flag: NoteFlag) -> Result<Note> {
        let column = flag.column();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let mut note = sqlx::query_as::<_, Note>(&format!(
            "UPDATE notes AS n SET {column} = NOT n.{column}, updated_at = NOW()
             WHERE n.id = $1 AND n.user_id = $2
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::note_not_found(id))?;

        fill_labels(&mut *tx, std::slice::from_mut(&mut note)).await?;
        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "notes",
            op = "toggle_flag",
            note_id = %id,
            column,
            value = note.flag(flag),
            "Flag toggled"
        );
        Ok(note)
    }

    async fn set_color(&self, id: Uuid, owner_id: Uuid, color: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE notes SET color = $3, updated_at = NOW() WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .bind(color)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::note_not_found(id));
        }
        Ok(())
    }

    async fn set_position(&self, id: Uuid, owner_id: Uuid, position: i32) -> Result<()> {
        let result = sqlx::query(
            "UPDATE notes SET position = $3, updated_at = NOW() WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .bind(position)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::note_not_found(id));
        }
        Ok(())
    }

    async fn soft_delete_note(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        self.execute_owned(
            "UPDATE notes SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1 AND user_id = $2",
            id,
            owner_id,
        )
        .await
    }

    async fn restore_note(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        self.execute_owned(
            "UPDATE notes SET is_deleted = FALSE, updated_at = NOW() WHERE id = $1 AND user_id = $2",
            id,
            owner_id,
        )
        .await
    }

    async fn hard_delete_note(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        // note_labels and attachments go with the row (ON DELETE CASCADE)
        self.execute_owned(
            "DELETE FROM notes WHERE id = $1 AND user_id = $2",
            id,
            owner_id,
        )
        .await
    }

    async fn list_notes(&self, owner_id: Uuid, query: ListNotesQuery) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes n
             WHERE n.user_id = $1
               AND ($2 OR n.is_archived = FALSE)
               AND ($3 OR n.is_deleted = FALSE)
             ORDER BY n.is_pinned DESC, n.position ASC, n.updated_at DESC"
        ))
        .bind(owner_id)
        .bind(query.include_archived)
        .bind(query.include_deleted)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        self.with_labels(notes).await
    }

    async fn list_view(&self, owner_id: Uuid, view: NoteView) -> Result<Vec<Note>> {
        let sql = match view {
            NoteView::Pinned => format!(
                "SELECT {NOTE_COLUMNS} FROM notes n
                 WHERE n.user_id = $1 AND n.is_pinned AND NOT n.is_archived AND NOT n.is_deleted
                 ORDER BY n.position ASC, n.updated_at DESC"
            ),
            NoteView::Archived => format!(
                "SELECT {NOTE_COLUMNS} FROM notes n
                 WHERE n.user_id = $1 AND n.is_archived AND NOT n.is_deleted
                 ORDER BY n.updated_at DESC"
            ),
        };
        let notes = sqlx::query_as::<_, Note>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        self.with_labels(notes).await
    }

    async fn search_notes(&self, owner_id: Uuid, query: &SearchQuery) -> Result<Vec<Note>> {
        let text = query
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(escape_like);

        let notes = sqlx::query_as::<_, Note>(&format!(
            r#"SELECT {NOTE_COLUMNS} FROM notes n
               WHERE n.user_id = $1
                 AND n.is_deleted = FALSE
                 AND ($2 OR n.is_archived = FALSE)
                 AND ($3::text IS NULL
                      OR n.title ILIKE '%' || $3 || '%' ESCAPE '\'
                      OR n.content ILIKE '%' || $3 || '%' ESCAPE '\')
                 AND ($4::text IS NULL OR n.color = $4)
                 AND (cardinality($5::uuid[]) = 0 OR EXISTS (
                      SELECT 1 FROM note_labels nl
                      WHERE nl.note_id = n.id AND nl.label_id = ANY($5)))
               ORDER BY n.is_pinned DESC, n.updated_at DESC
               LIMIT $6 OFFSET $7"#
        ))
        .bind(owner_id)
        .bind(query.include_archived)
        .bind(text)
        .bind(query.color.as_deref())
        .bind(query.label_ids.as_slice())
        .bind(query.limit)
        .bind(query.offset.unwrap_or(0))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        self.with_labels(notes).await
    }
}

/// Number of rows (deleted included) owned by a user.
pub async fn count_notes(pool: &Pool<Postgres>, owner_id: Uuid) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM notes WHERE user_id = $1")
        .bind(owner_id)
        .fetch_one(pool)
        .await
        .map_err(Error::Database)?;
    Ok(row.get("n"))
}
