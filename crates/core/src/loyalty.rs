//! Loyalty points: accrual on purchases, redemption as a discount, reversal on refund.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::CoreError;
use crate::money::round_money;

text_enum! {
    /// Why a customer's points balance changed.
    LoyaltyReason {
        Earned => "earned",
        Redeemed => "redeemed",
        Refund => "refund",
        Adjustment => "adjustment",
    }
}

/// Points earned for spending `amount`, rounded down to whole points.
pub fn points_earned(amount: Decimal, points_per_unit: i32) -> i64 {
    if amount <= Decimal::ZERO || points_per_unit <= 0 {
        return 0;
    }
    (amount * Decimal::from(points_per_unit))
        .floor()
        .to_i64()
        .unwrap_or(0)
}

/// Discount value of redeeming `points`.
pub fn redemption_value(points: i64, point_value: Decimal) -> Decimal {
    round_money(Decimal::from(points) * point_value)
}

/// Validate a redemption request and return the discount it is worth.
///
/// The customer cannot redeem more points than they hold, nor more value
/// than the order subtotal.
pub fn validate_redemption(
    balance: i64,
    requested: i64,
    subtotal: Decimal,
    point_value: Decimal,
) -> Result<Decimal, CoreError> {
    if requested < 0 {
        return Err(CoreError::Validation(format!(
            "Points to redeem must be non-negative, got {requested}"
        )));
    }
    if requested == 0 {
        return Ok(Decimal::ZERO);
    }
    if requested > balance {
        return Err(CoreError::Validation(format!(
            "Insufficient loyalty points: balance {balance}, requested {requested}"
        )));
    }
    let value = redemption_value(requested, point_value);
    if value > subtotal {
        return Err(CoreError::Validation(format!(
            "Redeeming {requested} points ({value}) exceeds the order subtotal ({subtotal})"
        )));
    }
    Ok(value)
}

/// Balance change applied when an order is refunded: redeemed points come
/// back, earned points are taken away.
pub fn refund_adjustment(points_earned: i64, points_redeemed: i64) -> i64 {
    points_redeemed - points_earned
}

/// New balance after a refund. Points the customer already spent are
/// forgiven rather than driving the balance negative.
pub fn balance_after_refund(balance: i64, delta: i64) -> i64 {
    (balance + delta).max(0)
}

/// Validate a manual adjustment and return the resulting balance.
pub fn validate_adjustment(balance: i64, delta: i64) -> Result<i64, CoreError> {
    if delta == 0 {
        return Err(CoreError::Validation(
            "Adjustment must change the balance".into(),
        ));
    }
    let new_balance = balance.checked_add(delta).ok_or_else(|| {
        CoreError::Validation("Adjustment overflows the points balance".into())
    })?;
    if new_balance < 0 {
        return Err(CoreError::Validation(format!(
            "Adjustment of {delta} would leave a negative balance (current {balance})"
        )));
    }
    Ok(new_balance)
}
