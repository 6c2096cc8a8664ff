//! HTTP surface tests against the in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use jotter_api::hub::SessionSettings;
use jotter_api::services::JwtAuthenticator;
use jotter_api::{build_router, parse_allowed_origins, AppState};
use jotter_db::MemoryStore;

fn app() -> Router {
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(JwtAuthenticator::new("http-test-secret", 24)),
        SessionSettings::default(),
    );
    build_router(state, parse_allowed_origins(None))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header("authorization", format!("Bearer {}", token));
    }
    let req = match body {
        Some(b) => req
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "email": email, "password": "password123", "name": "Tester" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
}

async fn create_note(app: &Router, token: &str, title: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/notes",
        Some(token),
        Some(json!({ "title": title })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/notes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = call(&app, Method::GET, "/notes", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_flow() {
    let app = app();
    let token = register(&app, "ada@example.com").await;

    let (status, me) = call(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ada@example.com");
    assert!(me.get("password_hash").is_none());

    let (status, _) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "email": "ada@example.com", "password": "password123", "name": "Ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    let (status, _) = call(&app, Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_foreign_note_is_not_found() {
    let app = app();
    let alice = register(&app, "alice@example.com").await;
    let bob = register(&app, "bob@example.com").await;
    let note_id = create_note(&app, &alice, "secret").await;

    for (method, uri) in [
        (Method::GET, format!("/notes/{}", note_id)),
        (Method::PATCH, format!("/notes/{}/pin", note_id)),
        (Method::DELETE, format!("/notes/{}?permanent=true", note_id)),
    ] {
        let (status, _) = call(&app, method, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }

    let (status, note) = call(
        &app,
        Method::GET,
        &format!("/notes/{}", note_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(note["is_pinned"], false);
}

#[tokio::test]
async fn test_soft_and_hard_delete_listing() {
    let app = app();
    let token = register(&app, "lists@example.com").await;
    let soft = create_note(&app, &token, "soft").await;
    let hard = create_note(&app, &token, "hard").await;

    call(&app, Method::DELETE, &format!("/notes/{}", soft), Some(&token), None).await;
    call(
        &app,
        Method::DELETE,
        &format!("/notes/{}?permanent=true", hard),
        Some(&token),
        None,
    )
    .await;

    let (_, default) = call(&app, Method::GET, "/notes", Some(&token), None).await;
    assert_eq!(default.as_array().unwrap().len(), 0);

    let (_, with_deleted) = call(&app, Method::GET, "/notes?deleted=true", Some(&token), None).await;
    let with_deleted = with_deleted.as_array().unwrap();
    assert_eq!(with_deleted.len(), 1);
    assert_eq!(with_deleted[0]["id"], soft.as_str());

    let (status, restored) = call(
        &app,
        Method::POST,
        &format!("/notes/{}/restore", soft),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(restored["is_deleted"], false);
}

#[tokio::test]
async fn test_label_conflicts_and_validation() {
    let app = app();
    let token = register(&app, "labels@example.com").await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/labels",
        Some(&token),
        Some(json!({ "name": "Work" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &app,
        Method::POST,
        "/labels",
        Some(&token),
        Some(json!({ "name": "Work" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "label with this name already exists");

    let (status, _) = call(
        &app,
        Method::POST,
        "/labels",
        Some(&token),
        Some(json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_and_views() {
    let app = app();
    let token = register(&app, "search@example.com").await;
    let groceries = create_note(&app, &token, "Groceries").await;
    create_note(&app, &token, "Todo").await;
    call(
        &app,
        Method::PATCH,
        &format!("/notes/{}/archive", groceries),
        Some(&token),
        None,
    )
    .await;

    let (status, hits) = call(&app, Method::GET, "/notes/search?q=grocer", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits.as_array().unwrap().len(), 1);

    let (_, hits) = call(
        &app,
        Method::POST,
        "/notes/search/advanced",
        Some(&token),
        Some(json!({ "query": "grocer" })),
    )
    .await;
    assert_eq!(hits.as_array().unwrap().len(), 0);

    let (_, archived) = call(&app, Method::GET, "/notes/archived", Some(&token), None).await;
    assert_eq!(archived.as_array().unwrap().len(), 1);

    let (status, _) = call(
        &app,
        Method::GET,
        "/notes/search?q=x&limit=500",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        Method::GET,
        "/notes/search?q=x&page=9223372036854775807",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "page is out of range");
}

#[tokio::test]
async fn test_openapi_document() {
    let app = app();
    let (status, doc) = call(&app, Method::GET, "/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["components"]["schemas"]["Note"].is_object());
}
