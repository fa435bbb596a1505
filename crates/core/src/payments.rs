//! Payment types, methods and the sign convention for amounts.
//!
//! A payment's amount is signed: positive money flows into the store,
//! negative money flows out. The sign is derived from the payment type so
//! callers always submit a magnitude, except for adjustments where the sign
//! is the caller's choice.

use rust_decimal::Decimal;

use crate::error::CoreError;
use crate::money::validate_magnitude;
use crate::types::DbId;

text_enum! {
    /// What a payment was for.
    PaymentType {
        Sale => "sale",
        Refund => "refund",
        Vendor => "vendor",
        Expense => "expense",
        Adjustment => "adjustment",
    }
}

text_enum! {
    /// How the money moved.
    PaymentMethod {
        Cash => "cash",
        Card => "card",
        BankTransfer => "bank_transfer",
        Check => "check",
        StoreCredit => "store_credit",
        Other => "other",
    }
}

text_enum! {
    /// Direction of a signed amount.
    PaymentDirection {
        Income => "income",
        Outflow => "outflow",
    }
}

/// Apply the sign convention of `kind` to a user-entered amount.
///
/// Sales become positive; refunds, vendor payments and expenses become
/// negative; adjustments keep their sign. Zero amounts are rejected.
pub fn normalize_amount(kind: PaymentType, amount: Decimal) -> Result<Decimal, CoreError> {
    if amount.is_zero() {
        return Err(CoreError::Validation(
            "Payment amount must be non-zero".into(),
        ));
    }
    validate_magnitude(amount, "Payment amount")?;
    Ok(match kind {
        PaymentType::Sale => amount.abs(),
        PaymentType::Refund | PaymentType::Vendor | PaymentType::Expense => -amount.abs(),
        PaymentType::Adjustment => amount,
    })
}

/// Direction of a signed amount. Zero counts as income.
pub fn direction(amount: Decimal) -> PaymentDirection {
    if amount < Decimal::ZERO {
        PaymentDirection::Outflow
    } else {
        PaymentDirection::Income
    }
}

/// Optional links from a payment to the record it settles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaymentReferences {
    pub order_id: Option<DbId>,
    pub vendor_id: Option<DbId>,
    pub purchase_order_id: Option<DbId>,
}

/// Validate that the references make sense for the payment type.
pub fn validate_references(kind: PaymentType, refs: &PaymentReferences) -> Result<(), CoreError> {
    match kind {
        PaymentType::Vendor if refs.vendor_id.is_none() => {
            return Err(CoreError::Validation(
                "Vendor payments must reference a vendor".into(),
            ));
        }
        PaymentType::Refund if refs.order_id.is_none() => {
            return Err(CoreError::Validation(
                "Refunds must reference the refunded order".into(),
            ));
        }
        _ => {}
    }
    if refs.purchase_order_id.is_some() && kind != PaymentType::Vendor {
        return Err(CoreError::Validation(
            "Only vendor payments may reference a purchase order".into(),
        ));
    }
    Ok(())
}

/// Sale, refund and expense payments belong to their order or expense and
/// are only removed together with it.
pub fn ensure_deletable(kind: PaymentType) -> Result<(), CoreError> {
    match kind {
        PaymentType::Vendor | PaymentType::Adjustment => Ok(()),
        other => Err(CoreError::Conflict(format!(
            "A {other} payment cannot be deleted on its own"
        ))),
    }
}
