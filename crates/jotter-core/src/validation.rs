//! Input validation for note, label, search, and account requests.
//!
//! Validators return [`Error::InvalidInput`] with a client-facing message.
//! They run before any store access so a rejected request never mutates state.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults::{
    LABEL_NAME_MAX_LEN, NAMED_COLORS, NAME_MAX_LEN, NAME_MIN_LEN, NOTE_CONTENT_MAX_LEN,
    NOTE_TITLE_MAX_LEN, PASSWORD_MIN_LEN, SEARCH_LIMIT_MAX, SEARCH_MAX_LABELS,
    SEARCH_QUERY_MAX_LEN,
};
use crate::error::{Error, Result};
use crate::traits::{CreateLabelRequest, CreateNoteRequest, UpdateLabelRequest, UpdateNoteRequest};

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$").expect("valid regex"));

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidInput(msg.into())
}

// =============================================================================
// COLORS
// =============================================================================

/// Note colors: `#rgb`, `#rrggbb`, or a named color (case-insensitive).
/// The empty string is accepted and means "reset to default".
pub fn validate_note_color(color: &str) -> Result<()> {
    if color.is_empty() || HEX_COLOR.is_match(color) {
        return Ok(());
    }
    let lower = color.to_lowercase();
    if NAMED_COLORS.contains(&lower.as_str()) {
        return Ok(());
    }
    Err(invalid(
        "invalid color format. Use hex color (#rrggbb) or predefined color name",
    ))
}

/// Label colors are strict `#rrggbb`.
pub fn validate_label_color(color: &str) -> Result<()> {
    let ok = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if ok {
        Ok(())
    } else {
        Err(invalid("color must be a valid hex color"))
    }
}

// =============================================================================
// NOTES
// =============================================================================

pub fn validate_create_note(req: &CreateNoteRequest) -> Result<()> {
    if req.title.trim().is_empty() && req.content.trim().is_empty() {
        return Err(invalid("either title or content must be provided"));
    }
    validate_title(&req.title)?;
    validate_content(&req.content)?;
    if let Some(color) = &req.color {
        validate_note_color(color)?;
    }
    Ok(())
}

pub fn validate_update_note(req: &UpdateNoteRequest) -> Result<()> {
    if let Some(title) = &req.title {
        validate_title(title)?;
    }
    if let Some(content) = &req.content {
        validate_content(content)?;
    }
    if let Some(color) = &req.color {
        validate_note_color(color)?;
    }
    if let Some(position) = req.position {
        validate_position(position)?;
    }
    Ok(())
}

pub fn validate_position(position: i32) -> Result<()> {
    if position < 0 {
        return Err(invalid("position must be non-negative"));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<()> {
    if title.len() > NOTE_TITLE_MAX_LEN {
        return Err(invalid(format!(
            "title must be at most {} characters",
            NOTE_TITLE_MAX_LEN
        )));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<()> {
    if content.len() > NOTE_CONTENT_MAX_LEN {
        return Err(invalid(format!(
            "content must be at most {} characters",
            NOTE_CONTENT_MAX_LEN
        )));
    }
    Ok(())
}

// =============================================================================
// LABELS
// =============================================================================

/// Trim and bound-check a label name, returning the stored form.
pub fn normalize_label_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(invalid("name cannot be empty"));
    }
    if trimmed.chars().count() > LABEL_NAME_MAX_LEN {
        return Err(invalid(format!(
            "name cannot exceed {} characters",
            LABEL_NAME_MAX_LEN
        )));
    }
    Ok(trimmed.to_string())
}

pub fn validate_create_label(req: &CreateLabelRequest) -> Result<()> {
    normalize_label_name(&req.name)?;
    if let Some(color) = req.color.as_deref().filter(|c| !c.is_empty()) {
        validate_label_color(color)?;
    }
    Ok(())
}

pub fn validate_update_label(req: &UpdateLabelRequest) -> Result<()> {
    if let Some(name) = &req.name {
        normalize_label_name(name)?;
    }
    if let Some(color) = req.color.as_deref().filter(|c| !c.is_empty()) {
        validate_label_color(color)?;
    }
    Ok(())
}

// =============================================================================
// SEARCH
// =============================================================================

pub fn validate_search_text(query: &str) -> Result<()> {
    if query.len() > SEARCH_QUERY_MAX_LEN {
        return Err(invalid(format!(
            "search query must be at most {} characters",
            SEARCH_QUERY_MAX_LEN
        )));
    }
    Ok(())
}

pub fn validate_pagination(limit: i64, page: i64) -> Result<()> {
    if !(0..=SEARCH_LIMIT_MAX).contains(&limit) {
        return Err(invalid(format!(
            "limit must be between 0 and {}",
            SEARCH_LIMIT_MAX
        )));
    }
    if page < 0 {
        return Err(invalid("page must be non-negative"));
    }
    Ok(())
}

pub fn validate_label_filter_count(count: usize) -> Result<()> {
    if count > SEARCH_MAX_LABELS {
        return Err(invalid(format!(
            "cannot filter by more than {} labels at once",
            SEARCH_MAX_LABELS
        )));
    }
    Ok(())
}

// =============================================================================
// ACCOUNTS
// =============================================================================

pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(invalid("email is required"));
    }
    if !EMAIL.is_match(email) {
        return Err(invalid("invalid email format"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(invalid("password is required"));
    }
    if password.len() < PASSWORD_MIN_LEN {
        return Err(invalid(format!(
            "password must be at least {} characters long",
            PASSWORD_MIN_LEN
        )));
    }
    Ok(())
}

pub fn validate_display_name(name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid("name is required"));
    }
    let len = name.chars().count();
    if len < NAME_MIN_LEN {
        return Err(invalid(format!(
            "name must be at least {} characters long",
            NAME_MIN_LEN
        )));
    }
    if len > NAME_MAX_LEN {
        return Err(invalid(format!(
            "name must be at most {} characters long",
            NAME_MAX_LEN
        )));
    }
    Ok(())
}
