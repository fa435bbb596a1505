//! Invoice model and DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopdesk_core::invoicing::{self, InvoiceStatus};
use shopdesk_core::types::{DbId, Timestamp};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Invoice {
    pub id: DbId,
    pub invoice_number: String,
    pub order_id: DbId,
    pub customer_id: Option<DbId>,
    pub amount: Decimal,
    pub status: String,
    pub issued_at: Option<Timestamp>,
    pub due_at: Option<Timestamp>,
    pub paid_at: Option<Timestamp>,
    pub notes: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Invoice with its overdue flag evaluated at response time.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub is_overdue: bool,
}

impl InvoiceView {
    pub fn new(invoice: Invoice, now: Timestamp) -> Self {
        let is_overdue = invoice
            .status
            .parse::<InvoiceStatus>()
            .map(|status| invoicing::is_overdue(status, invoice.due_at, now))
            .unwrap_or(false);
        Self {
            invoice,
            is_overdue,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvoice {
    pub order_id: DbId,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceFilter {
    pub status: Option<String>,
    pub customer_id: Option<DbId>,
    pub order_id: Option<DbId>,
}
