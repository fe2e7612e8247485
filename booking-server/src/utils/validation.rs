//! Input validation helpers
//!
//! Text length limits and the checks handlers run before touching the
//! database. SQLite TEXT has no length enforcement of its own.

use chrono::NaiveDate;
use shared::error::{AppError, ErrorCode};

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: package, category, person names
pub const MAX_NAME_LEN: usize = 200;

/// Package descriptions
pub const MAX_NOTE_LEN: usize = 2000;

/// Phone numbers and other short identifiers
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Free-text search terms
pub const MAX_SEARCH_LEN: usize = 100;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Required email, returned normalized (trimmed, lowercase)
pub fn require_email(value: Option<&str>, field: &str) -> Result<String, AppError> {
    let raw = value.ok_or_else(|| AppError::required(field))?;
    let email = shared::util::normalize_email(raw);
    if email.is_empty() {
        return Err(AppError::required(field));
    }
    if email.len() > MAX_EMAIL_LEN || !shared::util::is_valid_email(&email) {
        return Err(AppError::with_message(
            ErrorCode::InvalidFormat,
            format!("{field} is not a valid email address"),
        )
        .with_detail("field", field));
    }
    Ok(email)
}

/// `YYYY-MM-DD` calendar date
pub fn validate_date(value: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        AppError::with_message(
            ErrorCode::InvalidFormat,
            format!("{field} must be a date in YYYY-MM-DD format"),
        )
        .with_detail("field", field)
    })
}

/// Start and end dates, end not before start
pub fn validate_date_range(start: &str, end: &str) -> Result<(), AppError> {
    let start_date = validate_date(start, "start_date")?;
    let end_date = validate_date(end, "end_date")?;
    if end_date < start_date {
        return Err(AppError::validation("end_date must not be before start_date"));
    }
    Ok(())
}

/// Strictly positive integer field
pub fn validate_positive(value: i64, field: &str) -> Result<(), AppError> {
    if value <= 0 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("{field} must be greater than zero"),
        )
        .with_detail("field", field));
    }
    Ok(())
}
