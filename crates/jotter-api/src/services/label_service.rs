//! Label mutations and reads.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use jotter_core::defaults::DEFAULT_COLOR;
use jotter_core::validation::{
    normalize_label_name, validate_create_label, validate_update_label,
};
use jotter_core::{
    CreateLabelRequest, Error, Event, Label, Note, Result, Store, UpdateLabelRequest,
};

use crate::hub::Hub;

const NAME_TAKEN: &str = "label with this name already exists";

#[derive(Clone)]
pub struct LabelService {
    store: Arc<dyn Store>,
    hub: Arc<Hub>,
}

impl LabelService {
    pub fn new(store: Arc<dyn Store>, hub: Arc<Hub>) -> Self {
        Self { store, hub }
    }

    /// Create a label. Names are trimmed and unique per user (case-sensitive).
    pub async fn create(&self, owner_id: Uuid, req: CreateLabelRequest) -> Result<Label> {
        validate_create_label(&req)?;
        let name = normalize_label_name(&req.name)?;
        self.store.get_user(owner_id).await?;

        if self.store.find_label_by_name(owner_id, &name).await?.is_some() {
            return Err(Error::Conflict(NAME_TAKEN.to_string()));
        }

        let label = Label::new(owner_id, &name, req.color.filter(|c| !c.is_empty()));
        self.store.insert_label(&label).await?;
        let label = self.store.get_label(label.id, owner_id).await?;

        info!(
            subsystem = "api",
            component = "label_service",
            op = "create",
            user_id = %owner_id,
            label_id = %label.id,
            "Label created"
        );
        self.hub.dispatch(owner_id, &Event::LabelCreated(label.clone()));
        Ok(label)
    }

    /// Rename and/or recolor. Renaming onto another label's name is a conflict;
    /// renaming onto its own name is not.
    pub async fn update(&self, id: Uuid, owner_id: Uuid, req: UpdateLabelRequest) -> Result<Label> {
        validate_update_label(&req)?;
        let mut label = self.store.get_label(id, owner_id).await?;

        if let Some(name) = &req.name {
            let name = normalize_label_name(name)?;
            let existing = self.store.find_label_by_name(owner_id, &name).await?;
            if existing.is_some_and(|l| l.id != id) {
                return Err(Error::Conflict(NAME_TAKEN.to_string()));
            }
            label.name = name;
        }
        if let Some(color) = req.color {
            // Empty resets to the default, as on create
            label.color = if color.is_empty() {
                DEFAULT_COLOR.to_string()
            } else {
                color
            };
        }

        self.store.save_label(&label).await?;
        let label = self.store.get_label(id, owner_id).await?;
        self.hub.dispatch(owner_id, &Event::LabelUpdated(label.clone()));
        Ok(label)
    }

    /// Delete a label. Its note associations go with it; affected notes are
    /// not re-dispatched.
    pub async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        self.store.get_label(id, owner_id).await?;
        self.store.delete_label(id, owner_id).await?;
        info!(
            subsystem = "api",
            component = "label_service",
            op = "delete",
            user_id = %owner_id,
            label_id = %id,
            "Label deleted"
        );
        self.hub.dispatch(owner_id, &Event::label_deleted(id));
        Ok(())
    }

    pub async fn get(&self, id: Uuid, owner_id: Uuid) -> Result<Label> {
        self.store.get_label(id, owner_id).await
    }

    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<Label>> {
        self.store.list_labels(owner_id).await
    }

    /// Notes carrying a label the caller owns.
    pub async fn notes(&self, id: Uuid, owner_id: Uuid) -> Result<Vec<Note>> {
        self.store.get_label(id, owner_id).await?;
        self.store.notes_by_label(id, owner_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::Connection;
    use jotter_core::{LabelRepository, NoteRepository, User, UserRepository};
    use jotter_db::MemoryStore;

    async fn setup() -> (MemoryStore, Arc<Hub>, LabelService, User) {
        let store = MemoryStore::new();
        let hub = Arc::new(Hub::new());
        let user = User::new_local("alice@example.com", "Alice", "hash");
        store.insert_user(&user).await.unwrap();
        let labels = LabelService::new(Arc::new(store.clone()), Arc::clone(&hub));
        (store, hub, labels, user)
    }

    fn req(name: &str) -> CreateLabelRequest {
        CreateLabelRequest {
            name: name.to_string(),
            color: None,
        }
    }

    #[tokio::test]
    async fn test_label_name_conflict_scenario() {
        let (_store, hub, labels, user) = setup().await;
        let (conn, mut rx) = Connection::open(user.id, 16);
        hub.register(conn);

        let work = labels.create(user.id, req("  Work ")).await.unwrap();
        assert_eq!(work.name, "Work");

        let err = labels.create(user.id, req("Work")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let personal = labels.create(user.id, req("Personal")).await.unwrap();
        let err = labels
            .update(
                personal.id,
                user.id,
                UpdateLabelRequest {
                    name: Some("Work".to_string()),
                    color: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        // Case differs, so the rename is allowed
        let renamed = labels
            .update(
                personal.id,
                user.id,
                UpdateLabelRequest {
                    name: Some("personal".to_string()),
                    color: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "personal");

        let kinds: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|f| {
                let v: serde_json::Value = serde_json::from_str(&f).unwrap();
                v["type"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(kinds, vec!["label_created", "label_created", "label_updated"]);
    }

    #[tokio::test]
    async fn test_rename_to_own_name_is_allowed() {
        let (_store, _hub, labels, user) = setup().await;
        let work = labels.create(user.id, req("Work")).await.unwrap();

        let updated = labels
            .update(
                work.id,
                user.id,
                UpdateLabelRequest {
                    name: Some(" Work ".to_string()),
                    color: Some("#123456".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Work");
        assert_eq!(updated.color, "#123456");
    }

    #[tokio::test]
    async fn test_same_name_for_different_users() {
        let (store, _hub, labels, alice) = setup().await;
        let bob = User::new_local("bob@example.com", "Bob", "hash");
        store.insert_user(&bob).await.unwrap();

        labels.create(alice.id, req("Work")).await.unwrap();
        labels.create(bob.id, req("Work")).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_removes_associations() {
        let (store, hub, labels, user) = setup().await;
        let label = labels.create(user.id, req("Work")).await.unwrap();
        let note = Note::new(user.id, "t", "");
        store.insert_note(&note).await.unwrap();
        store.attach_label(note.id, label.id).await.unwrap();
        assert_eq!(labels.notes(label.id, user.id).await.unwrap().len(), 1);

        let (conn, mut rx) = Connection::open(user.id, 4);
        hub.register(conn);
        labels.delete(label.id, user.id).await.unwrap();

        let v: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(v["type"], "label_deleted");
        assert!(rx.try_recv().is_err());

        let note = store.get_note(note.id, user.id).await.unwrap();
        assert!(note.labels.is_empty());
        assert!(matches!(
            labels.get(label.id, user.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_foreign_label_is_not_found() {
        let (store, _hub, labels, alice) = setup().await;
        let bob = User::new_local("bob@example.com", "Bob", "hash");
        store.insert_user(&bob).await.unwrap();
        let label = labels.create(alice.id, req("Work")).await.unwrap();

        assert!(matches!(
            labels.delete(label.id, bob.id).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            labels.notes(label.id, bob.id).await,
            Err(Error::NotFound(_))
        ));
        assert_eq!(labels.list(alice.id).await.unwrap().len(), 1);
        assert!(store.get_label(label.id, alice.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_label_color_rejected() {
        let (_store, _hub, labels, user) = setup().await;
        let err = labels
            .create(
                user.id,
                CreateLabelRequest {
                    name: "Work".to_string(),
                    color: Some("red".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_update_with_empty_color_resets_to_default() {
        let (_store, _hub, labels, user) = setup().await;
        let work = labels
            .create(
                user.id,
                CreateLabelRequest {
                    name: "Work".to_string(),
                    color: Some("#123456".to_string()),
                },
            )
            .await
            .unwrap();

        let updated = labels
            .update(
                work.id,
                user.id,
                UpdateLabelRequest {
                    name: None,
                    color: Some(String::new()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.color, DEFAULT_COLOR);
        assert_eq!(updated.name, "Work");
    }
}
