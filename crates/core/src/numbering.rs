//! Human-facing document numbers derived from row ids.

use crate::types::DbId;

pub const PURCHASE_ORDER_PREFIX: &str = "PO";
pub const RECEIPT_PREFIX: &str = "RC";
pub const SALES_ORDER_PREFIX: &str = "SO";
pub const INVOICE_PREFIX: &str = "INV";

/// Format a document number as `PREFIX-` followed by the id zero-padded to six digits.
///
/// Ids wider than six digits are printed in full.
pub fn document_number(prefix: &str, id: DbId) -> String {
    format!("{prefix}-{id:06}")
}
