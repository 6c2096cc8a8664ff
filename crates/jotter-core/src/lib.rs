//! # jotter-core
//!
//! Core types, traits, and the real-time event protocol for jotter.
//!
//! This crate provides the data model, the storage and authentication traits,
//! request validation, and the wire envelope that the other jotter crates
//! depend on.

pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod traits;
pub mod uuid_utils;
pub mod validation;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{ClientMessage, DeletionMarker, Event, EventEnvelope, EventKind};
pub use models::*;
pub use traits::*;
pub use uuid_utils::{is_v7, new_v7};
