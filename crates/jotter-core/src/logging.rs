//! Structured logging field name constants for jotter.
//!
//! All crates use these names as `tracing` field keys so log aggregation can
//! query every subsystem the same way.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue (slow client evicted, bad token on upgrade) |
//! | INFO  | Lifecycle events (startup, connection opened/closed) |
//! | DEBUG | Decision points, dispatch fan-out counts |
//! | TRACE | Per-frame traffic |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "api", "hub", "db", "auth"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "registry", "connection", "note_service", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "register", "dispatch", "toggle_pin", "attach_label"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Acting / owning user UUID.
pub const USER_ID: &str = "user_id";

/// Note UUID being operated on.
pub const NOTE_ID: &str = "note_id";

/// Label UUID being operated on.
pub const LABEL_ID: &str = "label_id";

/// Live connection UUID.
pub const CONNECTION_ID: &str = "connection_id";

/// Id of the entity an event describes.
pub const ENTITY_ID: &str = "entity_id";

/// Wire event kind (`note_updated`, ...).
pub const EVENT_KIND: &str = "event_kind";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of connections an event was enqueued on.
pub const RECIPIENTS: &str = "recipients";

/// Number of connections evicted during one dispatch.
pub const EVICTED: &str = "evicted";

/// Total live connections after a registry change.
pub const ACTIVE: &str = "active";

/// Number of results returned by a listing or search.
pub const RESULT_COUNT: &str = "result_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Why a connection was evicted (`queue_full`, `closed`).
pub const REASON: &str = "reason";
