//! Expense categories and expense validation.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::error::CoreError;
use crate::money::validate_positive_amount;
use crate::validation::{
    validate_optional_text, validate_required_text, MAX_NAME_LEN, MAX_NOTE_LEN,
};

/// Maximum length of an expense category name.
pub const MAX_CATEGORY_NAME_LEN: usize = 100;

/// Color assigned to categories created without one.
pub const DEFAULT_COLOR: &str = "#6B7280";

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("hex color pattern is valid")
});

text_enum! {
    /// Whether an expense category recurs at a fixed amount or varies.
    ExpenseKind {
        Fixed => "FIXED",
        Variable => "VARIABLE",
    }
}

/// Validate a `#RRGGBB` display color.
pub fn validate_color(color: &str) -> Result<(), CoreError> {
    if !HEX_COLOR.is_match(color) {
        return Err(CoreError::Validation(format!(
            "Color must be a hex value like #1A2B3C, got '{color}'"
        )));
    }
    Ok(())
}

/// Canonical (upper-case) form of a valid color.
pub fn normalize_color(color: &str) -> String {
    color.to_ascii_uppercase()
}

pub fn validate_category_name(name: &str) -> Result<(), CoreError> {
    validate_required_text(name, "Category name", MAX_CATEGORY_NAME_LEN)
}

/// Validate the user-entered fields of an expense.
pub fn validate_expense(
    description: &str,
    amount: Decimal,
    notes: Option<&str>,
) -> Result<(), CoreError> {
    validate_required_text(description, "Description", MAX_NAME_LEN)?;
    validate_positive_amount(amount, "Expense amount")?;
    validate_optional_text(notes, "Notes", MAX_NOTE_LEN)
}
