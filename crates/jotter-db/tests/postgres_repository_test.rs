//! PostgreSQL repository tests.
//!
//! Run with a database: `DATABASE_URL=... cargo test -p jotter-db -- --ignored`

use jotter_db::test_fixtures::TestDatabase;
use jotter_db::{
    Error, Label, LabelRepository, ListNotesQuery, Note, NoteFlag, NoteRepository, NoteView,
    SearchQuery,
};
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_note_crud_is_owner_scoped() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.create_user().await;
    let other = test_db.create_user().await;

    let note = Note::new(owner.id, "Title", "Body");
    test_db.db.insert_note(&note).await.unwrap();

    let fetched = test_db.db.get_note(note.id, owner.id).await.unwrap();
    assert_eq!(fetched.title, "Title");
    assert_eq!(fetched.color, "#ffffff");

    let err = test_db.db.get_note(note.id, other.id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let err = test_db
        .db
        .set_color(note.id, other.id, "red")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_concurrent_toggles_both_commit() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.create_user().await;
    let note = Note::new(owner.id, "t", "c");
    test_db.db.insert_note(&note).await.unwrap();

    let (a, b) = tokio::join!(
        test_db.db.toggle_flag(note.id, owner.id, NoteFlag::Pinned),
        test_db.db.toggle_flag(note.id, owner.id, NoteFlag::Pinned),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    // Each toggle reports its own commit, so exactly one saw `true`.
    assert_ne!(a.is_pinned, b.is_pinned);
    let final_state = test_db.db.get_note(note.id, owner.id).await.unwrap();
    assert!(!final_state.is_pinned);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_soft_and_hard_delete_listing() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.create_user().await;
    let soft = Note::new(owner.id, "soft", "");
    let hard = Note::new(owner.id, "hard", "");
    test_db.db.insert_note(&soft).await.unwrap();
    test_db.db.insert_note(&hard).await.unwrap();

    test_db.db.soft_delete_note(soft.id, owner.id).await.unwrap();
    test_db.db.hard_delete_note(hard.id, owner.id).await.unwrap();

    let visible = test_db
        .db
        .list_notes(owner.id, ListNotesQuery::default())
        .await
        .unwrap();
    assert!(visible.is_empty());

    let all = test_db
        .db
        .list_notes(
            owner.id,
            ListNotesQuery {
                include_archived: true,
                include_deleted: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, soft.id);
    assert_eq!(
        jotter_db::notes::count_notes(&test_db.db.pool, owner.id)
            .await
            .unwrap(),
        1
    );

    test_db.db.restore_note(soft.id, owner.id).await.unwrap();
    let visible = test_db
        .db
        .list_notes(owner.id, ListNotesQuery::default())
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_label_uniqueness_and_attach() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.create_user().await;

    let work = Label::new(owner.id, "Work", Some("#112233".to_string()));
    test_db.db.insert_label(&work).await.unwrap();

    let dup = test_db
        .db
        .insert_label(&Label::new(owner.id, "Work", None))
        .await;
    assert!(matches!(dup, Err(Error::Conflict(_))));

    // Names compare case-sensitively
    test_db
        .db
        .insert_label(&Label::new(owner.id, "work", None))
        .await
        .unwrap();

    let note = Note::new(owner.id, "t", "c");
    test_db.db.insert_note(&note).await.unwrap();
    test_db.db.attach_label(note.id, work.id).await.unwrap();
    test_db.db.attach_label(note.id, work.id).await.unwrap();

    let fetched = test_db.db.get_note(note.id, owner.id).await.unwrap();
    assert_eq!(fetched.labels.len(), 1);
    assert_eq!(fetched.labels[0].name, "Work");

    let by_label = test_db.db.notes_by_label(work.id, owner.id).await.unwrap();
    assert_eq!(by_label.len(), 1);

    test_db.db.delete_label(work.id, owner.id).await.unwrap();
    let fetched = test_db.db.get_note(note.id, owner.id).await.unwrap();
    assert!(fetched.labels.is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_search_and_views() {
    let test_db = TestDatabase::new().await;
    let owner = test_db.create_user().await;

    let mut pinned = Note::new(owner.id, "Pinned groceries", "");
    pinned.is_pinned = true;
    let mut archived = Note::new(owner.id, "Old groceries", "");
    archived.is_archived = true;
    let plain = Note::new(owner.id, "Todo", "100% done");
    for n in [&pinned, &archived, &plain] {
        test_db.db.insert_note(n).await.unwrap();
    }

    let hits = test_db
        .db
        .search_notes(
            owner.id,
            &SearchQuery {
                text: Some("GROCERIES".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, pinned.id);

    // Wildcards in user input are matched literally
    let hits = test_db
        .db
        .search_notes(
            owner.id,
            &SearchQuery {
                text: Some("%".to_string()),
                include_archived: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, plain.id);

    let pinned_view = test_db
        .db
        .list_view(owner.id, NoteView::Pinned)
        .await
        .unwrap();
    assert_eq!(pinned_view.len(), 1);
    let archived_view = test_db
        .db
        .list_view(owner.id, NoteView::Archived)
        .await
        .unwrap();
    assert_eq!(archived_view.len(), 1);
    assert_eq!(archived_view[0].id, archived.id);

    let missing = test_db
        .db
        .search_notes(
            owner.id,
            &SearchQuery {
                label_ids: vec![Uuid::now_v7()],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(missing.is_empty());
}
