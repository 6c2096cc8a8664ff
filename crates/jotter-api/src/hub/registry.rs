//! Live-connection registry and per-user event fan-out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, warn};
use uuid::Uuid;

use jotter_core::{Event, EventEnvelope};

use super::connection::{Connection, ConnectionKey, Frame};

type UserConnections = HashMap<Uuid, tokio::sync::mpsc::Sender<Frame>>;

/// Registry of live connections indexed by owning user.
///
/// `register`, `unregister`, and `dispatch` all run under one mutex and never
/// await while holding it. Enqueueing uses `try_send`, so a slow peer can
/// only cost itself its connection.
pub struct Hub {
    users: Mutex<HashMap<Uuid, UserConnections>>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, UserConnections>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a connection to the live set.
    ///
    /// The registry takes the only sender of the connection's queue, so
    /// removing the entry is what closes the queue.
    pub fn register(&self, connection: Connection) {
        let Connection { key, outbound } = connection;
        let active = {
            let mut users = self.lock();
            users
                .entry(key.user_id)
                .or_default()
                .insert(key.id, outbound);
            users.get(&key.user_id).map_or(0, HashMap::len)
        };
        debug!(
            subsystem = "hub",
            op = "register",
            user_id = %key.user_id,
            connection_id = %key.id,
            active,
            "Connection registered"
        );
    }

    /// Remove a connection if present. Returns whether it was registered.
    pub fn unregister(&self, key: ConnectionKey) -> bool {
        let removed = {
            let mut users = self.lock();
            remove_locked(&mut users, key)
        };
        if removed {
            debug!(
                subsystem = "hub",
                op = "unregister",
                user_id = %key.user_id,
                connection_id = %key.id,
                "Connection unregistered"
            );
        }
        removed
    }

    /// Deliver an event to every live connection of `user_id`.
    ///
    /// Returns the number of connections the frame was enqueued on. A
    /// connection whose queue is full or closed is evicted; other connections
    /// of the same user still receive the frame.
    pub fn dispatch(&self, user_id: Uuid, event: &Event) -> usize {
        let frame: Frame = match EventEnvelope::new(user_id, event).and_then(|e| e.to_frame()) {
            Ok(json) => Arc::from(json),
            Err(e) => {
                error!(
                    subsystem = "hub",
                    op = "dispatch",
                    event_kind = %event.kind(),
                    error = %e,
                    "Failed to serialize event"
                );
                return 0;
            }
        };

        let mut delivered = 0;
        let mut evicted = Vec::new();
        {
            let mut users = self.lock();
            if let Some(conns) = users.get(&user_id) {
                for (id, tx) in conns {
                    match tx.try_send(Arc::clone(&frame)) {
                        Ok(()) => delivered += 1,
                        Err(TrySendError::Full(_)) => evicted.push((*id, "queue_full")),
                        Err(TrySendError::Closed(_)) => evicted.push((*id, "closed")),
                    }
                }
            }
            for (id, _) in &evicted {
                remove_locked(&mut users, ConnectionKey { id: *id, user_id });
            }
        }

        for (id, reason) in &evicted {
            warn!(
                subsystem = "hub",
                op = "evict",
                user_id = %user_id,
                connection_id = %id,
                reason,
                "Evicted connection"
            );
        }
        debug!(
            subsystem = "hub",
            op = "dispatch",
            user_id = %user_id,
            event_kind = %event.kind(),
            entity_id = %event.entity_id(),
            recipients = delivered,
            evicted = evicted.len(),
            "Event dispatched"
        );
        delivered
    }

    /// Enqueue a raw frame on one connection, evicting it if the queue is full.
    pub fn send_to(&self, key: ConnectionKey, frame: Frame) -> bool {
        let mut users = self.lock();
        let Some(tx) = users.get(&key.user_id).and_then(|c| c.get(&key.id)) else {
            return false;
        };
        match tx.try_send(frame) {
            Ok(()) => true,
            Err(_) => {
                remove_locked(&mut users, key);
                drop(users);
                warn!(
                    subsystem = "hub",
                    op = "evict",
                    user_id = %key.user_id,
                    connection_id = %key.id,
                    "Evicted connection on direct send"
                );
                false
            }
        }
    }

    /// Total live connections.
    pub fn connection_count(&self) -> usize {
        self.lock().values().map(HashMap::len).sum()
    }

    pub fn user_connection_count(&self, user_id: Uuid) -> usize {
        self.lock().get(&user_id).map_or(0, HashMap::len)
    }

    pub fn is_registered(&self, key: ConnectionKey) -> bool {
        self.lock()
            .get(&key.user_id)
            .is_some_and(|c| c.contains_key(&key.id))
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_locked(users: &mut HashMap<Uuid, UserConnections>, key: ConnectionKey) -> bool {
    let Some(conns) = users.get_mut(&key.user_id) else {
        return false;
    };
    let removed = conns.remove(&key.id).is_some();
    if conns.is_empty() {
        users.remove(&key.user_id);
    }
    removed
}
