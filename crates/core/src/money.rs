//! Monetary arithmetic on [`Decimal`].
//!
//! Amounts are rounded to cents with midpoint-away-from-zero, the rule the
//! storefront and back office apply everywhere a total is shown.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::CoreError;

/// Number of decimal places kept for monetary values.
pub const MONEY_DP: u32 = 2;

/// Largest single amount accepted from user input (1,000,000.00).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Largest computed total of a purchase order, sale or one of their lines
/// (1,000,000,000.00).
pub const MAX_DOCUMENT_TOTAL: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Largest tax rate accepted, in percent.
pub const MAX_TAX_RATE: Decimal = Decimal::ONE_HUNDRED;

/// Round a value to cents, midpoint away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// `rate_pct` percent of `amount`, rounded to cents.
pub fn percent_of(amount: Decimal, rate_pct: Decimal) -> Decimal {
    round_money(amount * rate_pct / Decimal::ONE_HUNDRED)
}

/// Validate a non-negative amount with at most two decimal places.
pub fn validate_amount(amount: Decimal, field: &str) -> Result<(), CoreError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(CoreError::Validation(format!(
            "{field} must be non-negative, got {amount}"
        )));
    }
    validate_magnitude(amount, field)
}

/// Validate a strictly positive amount with at most two decimal places.
pub fn validate_positive_amount(amount: Decimal, field: &str) -> Result<(), CoreError> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "{field} must be greater than zero, got {amount}"
        )));
    }
    validate_magnitude(amount, field)
}

/// Validate the absolute size and precision of an amount of either sign.
pub fn validate_magnitude(amount: Decimal, field: &str) -> Result<(), CoreError> {
    if amount.abs() > MAX_AMOUNT {
        return Err(CoreError::Validation(format!(
            "{field} exceeds maximum allowed ({MAX_AMOUNT}), got {amount}"
        )));
    }
    if amount.normalize().scale() > MONEY_DP {
        return Err(CoreError::Validation(format!(
            "{field} must have at most {MONEY_DP} decimal places, got {amount}"
        )));
    }
    Ok(())
}

/// Validate a tax rate given in percent (`0..=100`, two decimal places).
pub fn validate_tax_rate(rate: Decimal) -> Result<(), CoreError> {
    if rate < Decimal::ZERO || rate > MAX_TAX_RATE {
        return Err(CoreError::Validation(format!(
            "Tax rate must be between 0 and {MAX_TAX_RATE}, got {rate}"
        )));
    }
    if rate.normalize().scale() > MONEY_DP {
        return Err(CoreError::Validation(format!(
            "Tax rate must have at most {MONEY_DP} decimal places, got {rate}"
        )));
    }
    Ok(())
}

/// Reject a computed document total that would not fit a stored total
/// column (`NUMERIC(12, 2)`).
pub fn validate_document_total(total: Decimal, field: &str) -> Result<(), CoreError> {
    if total.abs() > MAX_DOCUMENT_TOTAL {
        return Err(CoreError::Validation(format!(
            "{field} exceeds maximum allowed ({MAX_DOCUMENT_TOTAL}), got {total}"
        )));
    }
    Ok(())
}
