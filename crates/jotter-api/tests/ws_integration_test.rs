//! End-to-end tests: HTTP mutations fan out to live WebSocket sessions.
//!
//! Each test binds a server on an ephemeral port over an in-memory store.
//! Mutations go through the same router in-process so tests can interleave
//! them with socket reads deterministically.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;
use tower::ServiceExt;

use jotter_api::hub::{Hub, SessionSettings};
use jotter_api::services::JwtAuthenticator;
use jotter_api::{build_router, parse_allowed_origins, AppState};
use jotter_db::MemoryStore;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

struct TestServer {
    ws_base: String,
    app: Router,
    hub: Arc<Hub>,
}

async fn spawn_test_server() -> TestServer {
    let tokens = Arc::new(JwtAuthenticator::new("integration-secret", 24));
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        tokens,
        SessionSettings {
            queue_capacity: 64,
            ping_interval: None,
        },
    );
    let hub = Arc::clone(&state.hub);
    let app = build_router(state, parse_allowed_origins(None));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = app.clone();
    tokio::spawn(async move {
        axum::serve(listener, server).await.unwrap();
    });

    // Give server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        ws_base: format!("ws://{}", addr),
        app,
        hub,
    }
}

impl TestServer {
    async fn call(
        &self,
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

        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Register a user and return (user_id, token).
    async fn register(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .call(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({ "email": email, "password": "password123", "name": "Tester" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        (
            body["user"]["id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    /// Open a session and wait until the hub has registered it.
    async fn connect(&self, token: &str) -> WsStream {
        let before = self.hub.connection_count();
        let url = format!("{}/ws?token={}", self.ws_base, token);
        let (ws, response) = tokio_tungstenite::connect_async(&url).await.unwrap();
        assert_eq!(response.status(), 101);

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while self.hub.connection_count() <= before {
            assert!(
                tokio::time::Instant::now() < deadline,
                "connection was never registered"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        ws
    }
}

/// Wait for the next text message, skipping Ping/Pong frames.
async fn next_text_message(ws: &mut WsStream) -> Value {
    let deadline = Duration::from_secs(5);
    let start = tokio::time::Instant::now();
    loop {
        let remaining = deadline.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            panic!("timeout waiting for WS text message");
        }
        let msg = tokio::time::timeout(remaining, ws.next())
            .await
            .expect("timeout waiting for WS message")
            .expect("stream ended")
            .expect("WS error");
        if msg.is_text() {
            return serde_json::from_str(&msg.into_text().unwrap()).unwrap();
        }
    }
}

async fn send_ping(ws: &mut WsStream) {
    ws.send(Message::Text(r#"{"type":"ping"}"#.into()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ping_is_answered_with_pong() {
    let server = spawn_test_server().await;
    let (_, token) = server.register("ping@example.com").await;
    let mut ws = server.connect(&token).await;

    send_ping(&mut ws).await;
    assert_eq!(next_text_message(&mut ws).await, json!({ "type": "pong" }));
}

#[tokio::test]
async fn test_unknown_and_malformed_messages_are_ignored() {
    let server = spawn_test_server().await;
    let (_, token) = server.register("noise@example.com").await;
    let mut ws = server.connect(&token).await;

    ws.send(Message::Text("not json".into())).await.unwrap();
    ws.send(Message::Text(r#"{"type":"typing"}"#.into()))
        .await
        .unwrap();
    send_ping(&mut ws).await;

    // The connection survives and the first reply is the pong
    assert_eq!(next_text_message(&mut ws).await["type"], "pong");
    assert_eq!(server.hub.connection_count(), 1);
}

#[tokio::test]
async fn test_invalid_token_is_rejected_before_upgrade() {
    let server = spawn_test_server().await;

    for url in [
        format!("{}/ws?token=not-a-jwt", server.ws_base),
        format!("{}/ws", server.ws_base),
    ] {
        match tokio_tungstenite::connect_async(&url).await {
            Err(tokio_tungstenite::tungstenite::Error::Http(resp)) => {
                assert_eq!(resp.status(), 401);
            }
            other => panic!("expected HTTP 401, got {:?}", other.map(|(_, r)| r.status())),
        }
    }
    assert_eq!(server.hub.connection_count(), 0);
}

#[tokio::test]
async fn test_note_mutations_reach_every_session_of_owner() {
    let server = spawn_test_server().await;
    let (user_id, token) = server.register("owner@example.com").await;
    let mut phone = server.connect(&token).await;
    let mut laptop = server.connect(&token).await;

    let (status, note) = server
        .call(
            Method::POST,
            "/notes",
            Some(token.as_str()),
            Some(json!({ "title": "Groceries", "content": "milk" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let note_id = note["id"].as_str().unwrap().to_string();

    let (status, pinned) = server
        .call(
            Method::PATCH,
            &format!("/notes/{}/pin", note_id),
            Some(token.as_str()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pinned["is_pinned"], true);

    for ws in [&mut phone, &mut laptop] {
        let created = next_text_message(ws).await;
        assert_eq!(created["type"], "note_created");
        assert_eq!(created["user_id"], user_id.as_str());
        assert_eq!(created["payload"]["title"], "Groceries");

        let updated = next_text_message(ws).await;
        assert_eq!(updated["type"], "note_updated");
        assert_eq!(updated["payload"]["id"], note_id.as_str());
        assert_eq!(updated["payload"]["is_pinned"], true);
    }

    let (status, _) = server
        .call(
            Method::DELETE,
            &format!("/notes/{}", note_id),
            Some(token.as_str()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let deleted = next_text_message(&mut phone).await;
    assert_eq!(deleted["type"], "note_deleted");
    assert_eq!(deleted["payload"], json!({ "id": note_id }));
}

#[tokio::test]
async fn test_other_users_receive_nothing() {
    let server = spawn_test_server().await;
    let (_, alice_token) = server.register("alice@example.com").await;
    let (_, bob_token) = server.register("bob@example.com").await;
    let mut alice = server.connect(&alice_token).await;

    let (status, _) = server
        .call(
            Method::POST,
            "/labels",
            Some(bob_token.as_str()),
            Some(json!({ "name": "Bob's label" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Anything dispatched to Alice would be queued ahead of the pong
    send_ping(&mut alice).await;
    assert_eq!(next_text_message(&mut alice).await["type"], "pong");
}

#[tokio::test]
async fn test_label_attach_reports_note_with_labels() {
    let server = spawn_test_server().await;
    let (_, token) = server.register("labels@example.com").await;

    let (_, note) = server
        .call(Method::POST, "/notes", Some(token.as_str()), Some(json!({ "title": "t" })))
        .await;
    let (_, label) = server
        .call(
            Method::POST,
            "/labels",
            Some(token.as_str()),
            Some(json!({ "name": "  Work  " })),
        )
        .await;
    assert_eq!(label["name"], "Work");

    let mut ws = server.connect(&token).await;
    let uri = format!("/notes/{}/labels", note["id"].as_str().unwrap());
    let body = json!({ "label_id": label["id"] });
    for _ in 0..2 {
        let (status, _) = server
            .call(Method::POST, &uri, Some(token.as_str()), Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    for _ in 0..2 {
        let event = next_text_message(&mut ws).await;
        assert_eq!(event["type"], "note_updated");
        let labels = event["payload"]["labels"].as_array().unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0]["name"], "Work");
    }
}

#[tokio::test]
async fn test_closed_session_is_unregistered() {
    let server = spawn_test_server().await;
    let (_, token) = server.register("close@example.com").await;
    let mut ws = server.connect(&token).await;
    assert_eq!(server.hub.connection_count(), 1);

    ws.close(None).await.unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while server.hub.connection_count() > 0 {
        assert!(tokio::time::Instant::now() < deadline, "session never unregistered");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
