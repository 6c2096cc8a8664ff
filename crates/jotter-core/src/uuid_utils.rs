//! UUID v7 utilities for time-ordered identifiers.
//!
//! Every persisted entity (users, notes, labels, attachments) and every live
//! connection gets a UUIDv7 so identifiers sort by creation time.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
///
/// # Example
///
/// ```
/// use jotter_core::uuid_utils::new_v7;
///
/// let a = new_v7();
/// let b = new_v7();
/// assert!(a <= b);
/// ```
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Check whether a UUID is version 7.
pub fn is_v7(id: &Uuid) -> bool {
    id.get_version_num() == 7
}
