//! One live WebSocket session: outbound queue, writer task, and reader task.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use jotter_core::defaults::{OUTBOUND_QUEUE_CAPACITY, PONG_FRAME, WS_PING_INTERVAL_SECS};
use jotter_core::{new_v7, ClientMessage};

use super::Hub;

/// A serialized text frame, shared across every recipient of one dispatch.
pub type Frame = Arc<str>;

/// How long the writer gets to drain after the reader ends.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Identity of a registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    pub id: Uuid,
    pub user_id: Uuid,
}

/// A connection about to be handed to the [`Hub`].
///
/// Holds the only sender for its outbound queue. Once registered, the hub owns
/// that sender; the matching receiver is drained by the writer task.
#[derive(Debug)]
pub struct Connection {
    pub(super) key: ConnectionKey,
    pub(super) outbound: mpsc::Sender<Frame>,
}

impl Connection {
    /// Create a connection for `user_id` with a bounded outbound queue.
    pub fn open(user_id: Uuid, capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let conn = Self {
            key: ConnectionKey {
                id: new_v7(),
                user_id,
            },
            outbound: tx,
        };
        (conn, rx)
    }

    pub fn key(&self) -> ConnectionKey {
        self.key
    }
}

/// Per-session tuning.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub queue_capacity: usize,
    /// Keepalive transport ping interval. `None` disables it.
    pub ping_interval: Option<Duration>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            queue_capacity: OUTBOUND_QUEUE_CAPACITY,
            ping_interval: Some(Duration::from_secs(WS_PING_INTERVAL_SECS)),
        }
    }
}

/// Drive an upgraded socket for an authenticated user until either side ends.
///
/// The connection is registered before this returns control to the runtime
/// and is always unregistered on exit.
pub async fn serve_socket(
    socket: WebSocket,
    hub: Arc<Hub>,
    user_id: Uuid,
    settings: SessionSettings,
) {
    let (conn, outbox) = Connection::open(user_id, settings.queue_capacity);
    let key = conn.key();
    hub.register(conn);
    info!(
        subsystem = "hub",
        component = "connection",
        user_id = %user_id,
        connection_id = %key.id,
        active = hub.connection_count(),
        "WebSocket connection opened"
    );

    let (sink, stream) = socket.split();
    let mut writer = tokio::spawn(write_loop(sink, outbox, key, settings.ping_interval));
    let mut reader = tokio::spawn(read_loop(stream, Arc::clone(&hub), key));

    tokio::select! {
        _ = &mut writer => {
            reader.abort();
        }
        _ = &mut reader => {
            // Dropping the registry's sender closes the queue and lets the
            // writer flush what is pending before sending Close.
            hub.unregister(key);
            if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
                writer.abort();
            }
        }
    }

    hub.unregister(key);
    info!(
        subsystem = "hub",
        component = "connection",
        user_id = %user_id,
        connection_id = %key.id,
        active = hub.connection_count(),
        "WebSocket connection closed"
    );
}

async fn write_loop<S>(
    mut sink: S,
    mut outbox: mpsc::Receiver<Frame>,
    key: ConnectionKey,
    ping_interval: Option<Duration>,
) where
    S: futures::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let mut ticker = ping_interval.map(|d| interval_at(Instant::now() + d, d));

    loop {
        tokio::select! {
            frame = outbox.recv() => match frame {
                Some(frame) => {
                    trace!(connection_id = %key.id, bytes = frame.len(), "Writing frame");
                    if let Err(e) = sink.send(Message::Text(frame.to_string())).await {
                        warn!(
                            subsystem = "hub",
                            component = "connection",
                            connection_id = %key.id,
                            error = %e,
                            "WebSocket write failed"
                        );
                        return;
                    }
                }
                None => {
                    // Unregistered or evicted
                    let _ = sink.send(Message::Close(None)).await;
                    return;
                }
            },
            _ = tick(&mut ticker) => {
                if let Err(e) = sink.send(Message::Ping(Vec::new())).await {
                    debug!(
                        subsystem = "hub",
                        component = "connection",
                        connection_id = %key.id,
                        error = %e,
                        "Keepalive ping failed"
                    );
                    return;
                }
            }
        }
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn read_loop<S, E>(mut stream: S, hub: Arc<Hub>, key: ConnectionKey)
where
    S: futures::Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    while let Some(msg) = stream.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                debug!(
                    subsystem = "hub",
                    component = "connection",
                    connection_id = %key.id,
                    error = %e,
                    "WebSocket read failed"
                );
                return;
            }
        };

        match msg {
            Message::Text(text) => match ClientMessage::parse(&text) {
                Ok(ClientMessage::Ping) => {
                    hub.send_to(key, Arc::from(PONG_FRAME));
                }
                Ok(ClientMessage::Unknown) => {
                    debug!(connection_id = %key.id, "Ignoring unknown client message type");
                }
                Err(e) => {
                    debug!(connection_id = %key.id, error = %e, "Ignoring malformed client message");
                }
            },
            Message::Close(_) => return,
            // Transport pings are answered by axum; binary frames carry nothing for us
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc as fmpsc;

    #[test]
    fn test_open_assigns_distinct_ids() {
        let user = Uuid::now_v7();
        let (a, _) = Connection::open(user, 4);
        let (b, _) = Connection::open(user, 4);
        assert_ne!(a.key().id, b.key().id);
        assert_eq!(a.key().user_id, user);
    }

    #[tokio::test]
    async fn test_writer_flushes_then_closes_when_queue_closes() {
        let (sink, mut written) = fmpsc::unbounded::<Message>();
        let (conn, outbox) = Connection::open(Uuid::now_v7(), 4);
        let key = conn.key();

        conn.outbound.try_send(Arc::from("one")).unwrap();
        conn.outbound.try_send(Arc::from("two")).unwrap();
        drop(conn);

        write_loop(sink, outbox, key, None).await;

        assert_eq!(written.next().await, Some(Message::Text("one".into())));
        assert_eq!(written.next().await, Some(Message::Text("two".into())));
        assert_eq!(written.next().await, Some(Message::Close(None)));
    }

    #[tokio::test]
    async fn test_reader_answers_ping_and_ignores_garbage() {
        let hub = Arc::new(Hub::new());
        let (conn, mut outbox) = Connection::open(Uuid::now_v7(), 4);
        let key = conn.key();
        hub.register(conn);

        let inbound = futures::stream::iter(vec![
            Ok::<_, std::io::Error>(Message::Text("not json".into())),
            Ok(Message::Text(r#"{"type":"subscribe"}"#.into())),
            Ok(Message::Text(r#"{"type":"ping"}"#.into())),
        ]);
        read_loop(inbound, Arc::clone(&hub), key).await;

        assert_eq!(&*outbox.try_recv().unwrap(), PONG_FRAME);
        assert!(outbox.try_recv().is_err());
        assert!(hub.is_registered(key));
    }

    #[tokio::test]
    async fn test_reader_stops_on_close_frame() {
        let hub = Arc::new(Hub::new());
        let (conn, mut outbox) = Connection::open(Uuid::now_v7(), 4);
        let key = conn.key();
        hub.register(conn);

        let inbound = futures::stream::iter(vec![
            Ok::<_, std::io::Error>(Message::Close(None)),
            Ok(Message::Text(r#"{"type":"ping"}"#.into())),
        ]);
        read_loop(inbound, hub, key).await;

        assert!(outbox.try_recv().is_err());
    }
}
