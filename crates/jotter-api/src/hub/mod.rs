//! Real-time notification hub.
//!
//! [`Hub`] is the registry of live WebSocket connections and the dispatcher
//! that fans committed events out to a user's sessions. [`connection`] owns
//! the per-socket reader and writer tasks.

pub mod connection;
mod registry;

pub use connection::{serve_socket, Connection, ConnectionKey, Frame, SessionSettings};
pub use registry::Hub;
