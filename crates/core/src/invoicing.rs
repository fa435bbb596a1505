//! Customer invoices issued for sales orders.

use crate::error::CoreError;
use crate::types::Timestamp;

/// Payment terms used when settings do not specify any.
pub const DEFAULT_DUE_DAYS: i32 = 30;

/// Longest payment term accepted.
pub const MAX_DUE_DAYS: i32 = 365;

text_enum! {
    InvoiceStatus {
        Draft => "draft",
        Issued => "issued",
        Paid => "paid",
        Void => "void",
    }
}

/// draft → issued | void, issued → paid | void.
pub fn ensure_transition(from: InvoiceStatus, to: InvoiceStatus) -> Result<(), CoreError> {
    use InvoiceStatus::*;
    let allowed = matches!(
        (from, to),
        (Draft, Issued) | (Draft, Void) | (Issued, Paid) | (Issued, Void)
    );
    if !allowed {
        return Err(CoreError::Conflict(format!(
            "Cannot move invoice from {from} to {to}"
        )));
    }
    Ok(())
}

pub fn validate_due_days(days: i32) -> Result<(), CoreError> {
    if !(0..=MAX_DUE_DAYS).contains(&days) {
        return Err(CoreError::Validation(format!(
            "Invoice due days must be between 0 and {MAX_DUE_DAYS}, got {days}"
        )));
    }
    Ok(())
}

pub fn due_date(issued_at: Timestamp, days: i32) -> Timestamp {
    issued_at + chrono::Duration::days(i64::from(days))
}

/// An issued invoice past its due date.
pub fn is_overdue(status: InvoiceStatus, due_at: Option<Timestamp>, now: Timestamp) -> bool {
    status == InvoiceStatus::Issued && due_at.is_some_and(|due| due < now)
}
