//! Real-time event types and the WebSocket wire protocol.
//!
//! Inside the process an event is a closed [`Event`] enum carrying the affected
//! entity. It becomes a string-tagged [`EventEnvelope`] only at the transport
//! edge:
//!
//! ```text
//! {"type":"note_updated","user_id":"0192...","payload":{...note...}}
//! {"type":"note_deleted","user_id":"0192...","payload":{"id":"0193..."}}
//! ```
//!
//! The only inbound message the server acts on is `{"type":"ping"}`, answered
//! with the literal [`PONG_FRAME`](crate::defaults::PONG_FRAME).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Label, Note};

// ============================================================================
// Event kinds
// ============================================================================

/// Wire name of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    NoteCreated,
    NoteUpdated,
    NoteDeleted,
    LabelCreated,
    LabelUpdated,
    LabelDeleted,
}

impl EventKind {
    /// The wire string, e.g. `"note_updated"`.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::NoteCreated => "note_created",
            EventKind::NoteUpdated => "note_updated",
            EventKind::NoteDeleted => "note_deleted",
            EventKind::LabelCreated => "label_created",
            EventKind::LabelUpdated => "label_updated",
            EventKind::LabelDeleted => "label_deleted",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a deletion event. Clients already hold the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionMarker {
    pub id: Uuid,
}

// ============================================================================
// Events
// ============================================================================

/// A committed change to one user's data.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    NoteCreated(Note),
    NoteUpdated(Note),
    NoteDeleted(DeletionMarker),
    LabelCreated(Label),
    LabelUpdated(Label),
    LabelDeleted(DeletionMarker),
}

impl Event {
    /// Deletion event for a note id.
    pub fn note_deleted(id: Uuid) -> Self {
        Event::NoteDeleted(DeletionMarker { id })
    }

    /// Deletion event for a label id.
    pub fn label_deleted(id: Uuid) -> Self {
        Event::LabelDeleted(DeletionMarker { id })
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::NoteCreated(_) => EventKind::NoteCreated,
            Event::NoteUpdated(_) => EventKind::NoteUpdated,
            Event::NoteDeleted(_) => EventKind::NoteDeleted,
            Event::LabelCreated(_) => EventKind::LabelCreated,
            Event::LabelUpdated(_) => EventKind::LabelUpdated,
            Event::LabelDeleted(_) => EventKind::LabelDeleted,
        }
    }

    /// Id of the affected entity.
    pub fn entity_id(&self) -> Uuid {
        match self {
            Event::NoteCreated(n) | Event::NoteUpdated(n) => n.id,
            Event::LabelCreated(l) | Event::LabelUpdated(l) => l.id,
            Event::NoteDeleted(m) | Event::LabelDeleted(m) => m.id,
        }
    }

    fn payload(&self) -> Result<serde_json::Value> {
        let value = match self {
            Event::NoteCreated(n) | Event::NoteUpdated(n) => serde_json::to_value(n)?,
            Event::LabelCreated(l) | Event::LabelUpdated(l) => serde_json::to_value(l)?,
            Event::NoteDeleted(m) | Event::LabelDeleted(m) => serde_json::to_value(m)?,
        };
        Ok(value)
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// Outbound frame body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub user_id: String,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Wrap an event for the given owner.
    pub fn new(user_id: Uuid, event: &Event) -> Result<Self> {
        Ok(Self {
            kind: event.kind(),
            user_id: user_id.to_string(),
            payload: event.payload()?,
        })
    }

    /// Serialize to the text frame sent over the socket.
    pub fn to_frame(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Inbound messages
// ============================================================================

/// A message received from a client.
///
/// Unknown `type` values decode as [`ClientMessage::Unknown`] so newer
/// clients do not break older servers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Decode a text frame.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
