//! Centralized default constants for jotter.
//!
//! Every crate references these instead of defining its own magic numbers.

// =============================================================================
// REAL-TIME HUB
// =============================================================================

/// Pending outbound messages per connection before the connection is evicted.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Interval between keepalive WebSocket ping frames (seconds). 0 disables.
pub const WS_PING_INTERVAL_SECS: u64 = 30;

/// Literal reply to an inbound `{"type":"ping"}` frame.
pub const PONG_FRAME: &str = r#"{"type":"pong"}"#;

// =============================================================================
// ENTITIES
// =============================================================================

/// Color assigned to notes and labels created without one.
pub const DEFAULT_COLOR: &str = "#ffffff";

/// Maximum note title length (bytes).
pub const NOTE_TITLE_MAX_LEN: usize = 255;

/// Maximum note content length (bytes).
pub const NOTE_CONTENT_MAX_LEN: usize = 10_000;

/// Maximum label name length after trimming.
pub const LABEL_NAME_MAX_LEN: usize = 50;

/// Named colors accepted in addition to `#rgb` / `#rrggbb`.
pub const NAMED_COLORS: &[&str] = &[
    "white", "red", "orange", "yellow", "green", "teal", "blue", "purple", "pink", "brown",
    "gray", "grey",
];

// =============================================================================
// SEARCH & PAGINATION
// =============================================================================

/// Maximum length of a search query.
pub const SEARCH_QUERY_MAX_LEN: usize = 100;

/// Default page size for search.
pub const SEARCH_LIMIT: i64 = 20;

/// Largest accepted page size for search.
pub const SEARCH_LIMIT_MAX: i64 = 100;

/// Largest number of labels an advanced search may filter by.
pub const SEARCH_MAX_LABELS: usize = 10;

// =============================================================================
// AUTH
// =============================================================================

/// Access token lifetime (hours).
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Minimum password length at registration.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Display name bounds at registration.
pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 100;

/// Provider recorded for email/password accounts.
pub const LOCAL_PROVIDER: &str = "local";

// =============================================================================
// SERVER
// =============================================================================

/// Default listen port.
pub const SERVER_PORT: u16 = 8080;

/// Default listen host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default CORS origin when `ALLOWED_ORIGINS` is unset.
pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";

// =============================================================================
// DATABASE
// =============================================================================

/// Upper bound on pooled PostgreSQL connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Seconds a request waits for a pooled connection.
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;
