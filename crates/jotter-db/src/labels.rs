//! Label repository implementation.
//!
//! Label names are unique per user and compared case-sensitively; the
//! `labels_user_name_unique` constraint backs the service-level check.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, Pool, Postgres, Row};
use uuid::Uuid;

use jotter_core::{Error, Label, LabelRepository, Note, Result};

use crate::map_unique_violation;
use crate::notes::{fill_labels, NOTE_COLUMNS};

const LABEL_COLUMNS: &str = "l.id, l.user_id, l.name, l.color, l.created_at, l.updated_at";

/// PostgreSQL implementation of LabelRepository.
pub struct PgLabelRepository {
    pool: Pool<Postgres>,
}

impl PgLabelRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Labels of each note id, ordered by name.
pub(crate) async fn labels_for_notes(
    conn: &mut PgConnection,
    note_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Label>>> {
    let rows = sqlx::query(&format!(
        "SELECT nl.note_id, {LABEL_COLUMNS}
         FROM note_labels nl
         JOIN labels l ON l.id = nl.label_id
         WHERE nl.note_id = ANY($1)
         ORDER BY l.name"
    ))
    .bind(note_ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(Error::Database)?;

    let mut by_note: HashMap<Uuid, Vec<Label>> = HashMap::new();
    for row in rows {
        let note_id: Uuid = row.get("note_id");
        by_note.entry(note_id).or_default().push(Label {
            id: row.get("id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            color: row.get("color"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        });
    }
    Ok(by_note)
}

#[async_trait]
impl LabelRepository for PgLabelRepository {
    async fn get_label(&self, id: Uuid, owner_id: Uuid) -> Result<Label> {
        sqlx::query_as::<_, Label>(&format!(
            "SELECT {LABEL_COLUMNS} FROM labels l WHERE l.id = $1 AND l.user_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::label_not_found(id))
    }

    async fn insert_label(&self, label: &Label) -> Result<()> {
        sqlx::query(
            "INSERT INTO labels (id, user_id, name, color, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(label.id)
        .bind(label.user_id)
        .bind(&label.name)
        .bind(&label.color)
        .bind(label.created_at)
        .bind(label.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "label with this name already exists"))?;
        Ok(())
    }

    async fn save_label(&self, label: &Label) -> Result<()> {
        let result = sqlx::query(
            "UPDATE labels SET name = $3, color = $4, updated_at = $5
             WHERE id = $1 AND user_id = $2",
        )
        .bind(label.id)
        .bind(label.user_id)
        .bind(&label.name)
        .bind(&label.color)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "label with this name already exists"))?;
        if result.rows_affected() == 0 {
            return Err(Error::label_not_found(label.id));
        }
        Ok(())
    }

    async fn delete_label(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        // note_labels rows cascade
        let result = sqlx::query("DELETE FROM labels WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::label_not_found(id));
        }
        Ok(())
    }

    async fn find_label_by_name(&self, owner_id: Uuid, name: &str) -> Result<Option<Label>> {
        sqlx::query_as::<_, Label>(&format!(
            "SELECT {LABEL_COLUMNS} FROM labels l WHERE l.user_id = $1 AND l.name = $2"
        ))
        .bind(owner_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn list_labels(&self, owner_id: Uuid) -> Result<Vec<Label>> {
        sqlx::query_as::<_, Label>(&format!(
            "SELECT {LABEL_COLUMNS} FROM labels l WHERE l.user_id = $1 ORDER BY l.name ASC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn notes_by_label(&self, label_id: Uuid, owner_id: Uuid) -> Result<Vec<Note>> {
        let mut notes = sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS}
             FROM notes n
             JOIN note_labels nl ON nl.note_id = n.id
             WHERE nl.label_id = $1 AND n.user_id = $2 AND n.is_deleted = FALSE
             ORDER BY n.updated_at DESC"
        ))
        .bind(label_id)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        fill_labels(&mut *conn, &mut notes).await?;
        Ok(notes)
    }

    async fn attach_label(&self, note_id: Uuid, label_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO note_labels (note_id, label_id) VALUES ($1, $2)
             ON CONFLICT (note_id, label_id) DO NOTHING",
        )
        .bind(note_id)
        .bind(label_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn detach_label(&self, note_id: Uuid, label_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM note_labels WHERE note_id = $1 AND label_id = $2")
            .bind(note_id)
            .bind(label_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
