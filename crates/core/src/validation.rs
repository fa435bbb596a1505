//! Shared input validation helpers.
//!
//! Every helper returns [`CoreError::Validation`] naming the offending field
//! so handlers can propagate the error with `?`.

use validator::ValidateEmail;

use crate::error::CoreError;

/// Maximum length for short names (customers, vendors, products, categories).
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length for free-text notes and descriptions.
pub const MAX_NOTE_LEN: usize = 2000;

/// Validate that a required text field is non-blank and within `max_len` characters.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    validate_max_len(value, field, max_len)
}

/// Validate an optional text field against a maximum length.
pub fn validate_optional_text(
    value: Option<&str>,
    field: &str,
    max_len: usize,
) -> Result<(), CoreError> {
    match value {
        Some(v) => validate_max_len(v, field, max_len),
        None => Ok(()),
    }
}

fn validate_max_len(value: &str, field: &str, max_len: usize) -> Result<(), CoreError> {
    let len = value.chars().count();
    if len > max_len {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {max_len} characters, got {len}"
        )));
    }
    Ok(())
}

/// Validate an optional email address. Empty strings are rejected; use `None` instead.
pub fn validate_email(email: Option<&str>) -> Result<(), CoreError> {
    match email {
        Some(e) if !e.validate_email() => Err(CoreError::Validation(format!(
            "Invalid email address: '{e}'"
        ))),
        _ => Ok(()),
    }
}

/// Validate that a collection size falls within `1..=max`.
///
/// `label` names the collection in the error message (e.g. "Cart").
pub fn validate_count_range(count: usize, max: usize, label: &str) -> Result<(), CoreError> {
    if count == 0 {
        return Err(CoreError::Validation(format!(
            "{label} must contain at least one item"
        )));
    }
    if count > max {
        return Err(CoreError::Validation(format!(
            "{label} may contain at most {max} items, got {count}"
        )));
    }
    Ok(())
}

/// Trim a value and turn blank strings into `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn required_text_rejects_blank() {
        assert_matches!(
            validate_required_text("   ", "Name", 10),
            Err(CoreError::Validation(msg)) if msg.contains("Name")
        );
    }

    #[test]
    fn required_text_enforces_length() {
        assert!(validate_required_text("abcdefghij", "Name", 10).is_ok());
        assert!(validate_required_text("abcdefghijk", "Name", 10).is_err());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(validate_required_text("ééééé", "Name", 5).is_ok());
    }

    #[test]
    fn optional_text_accepts_none() {
        assert!(validate_optional_text(None, "Notes", 3).is_ok());
        assert!(validate_optional_text(Some("abcd"), "Notes", 3).is_err());
    }

    #[test]
    fn email_validation() {
        assert!(validate_email(None).is_ok());
        assert!(validate_email(Some("jane@example.com")).is_ok());
        assert!(validate_email(Some("not-an-email")).is_err());
        assert!(validate_email(Some("")).is_err());
    }

    #[test]
    fn count_range_bounds() {
        assert!(validate_count_range(0, 5, "Cart").is_err());
        assert!(validate_count_range(1, 5, "Cart").is_ok());
        assert!(validate_count_range(5, 5, "Cart").is_ok());
        assert!(validate_count_range(6, 5, "Cart").is_err());
    }

    #[test]
    fn normalize_optional_drops_blank() {
        assert_eq!(normalize_optional(Some("  ".into())), None);
        assert_eq!(normalize_optional(Some(" a ".into())), Some("a".into()));
        assert_eq!(normalize_optional(None), None);
    }
}
