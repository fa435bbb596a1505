//! Product and stock validation.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::error::CoreError;
use crate::money::validate_amount;
use crate::validation::{
    validate_optional_text, validate_required_text, MAX_NAME_LEN, MAX_NOTE_LEN,
};

/// Maximum SKU length.
pub const MAX_SKU_LEN: usize = 64;

static SKU_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,63}$").expect("SKU pattern is valid")
});

/// SKUs start with an alphanumeric and contain only letters, digits, `.`, `_`, `-`.
pub fn validate_sku(sku: &str) -> Result<(), CoreError> {
    if !SKU_PATTERN.is_match(sku) {
        return Err(CoreError::Validation(format!(
            "SKU must be 1-{MAX_SKU_LEN} letters, digits, '.', '_' or '-', got '{sku}'"
        )));
    }
    Ok(())
}

/// Validate the user-entered fields of a product.
pub fn validate_product(
    name: &str,
    description: Option<&str>,
    price: Decimal,
    cost: Decimal,
) -> Result<(), CoreError> {
    validate_required_text(name, "Product name", MAX_NAME_LEN)?;
    validate_optional_text(description, "Description", MAX_NOTE_LEN)?;
    validate_amount(price, "Price")?;
    validate_amount(cost, "Cost")?;
    Ok(())
}

pub fn validate_reorder_level(level: i32) -> Result<(), CoreError> {
    if level < 0 {
        return Err(CoreError::Validation(format!(
            "Reorder level must be non-negative, got {level}"
        )));
    }
    Ok(())
}

/// Validate a manual stock adjustment and return the resulting quantity.
pub fn validate_stock_adjustment(current: i32, delta: i32) -> Result<i32, CoreError> {
    if delta == 0 {
        return Err(CoreError::Validation(
            "Stock adjustment must be non-zero".into(),
        ));
    }
    let new_quantity = current
        .checked_add(delta)
        .ok_or_else(|| CoreError::Validation("Stock adjustment overflows".into()))?;
    if new_quantity < 0 {
        return Err(CoreError::Validation(format!(
            "Adjustment of {delta} would leave negative stock (current {current})"
        )));
    }
    Ok(new_quantity)
}

/// A product needs reordering once stock falls to its reorder level.
pub fn is_low_stock(stock_quantity: i32, reorder_level: i32) -> bool {
    stock_quantity <= reorder_level
}

/// Fail with a conflict when fewer than `requested` units are on hand.
pub fn ensure_in_stock(
    product_name: &str,
    stock_quantity: i32,
    requested: i32,
) -> Result<(), CoreError> {
    if requested > stock_quantity {
        return Err(CoreError::Conflict(format!(
            "Insufficient stock for '{product_name}': {stock_quantity} available, {requested} requested"
        )));
    }
    Ok(())
}
