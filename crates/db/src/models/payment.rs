//! Payment entity model and DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopdesk_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A payment row. Positive amounts are income, negative amounts are outflows.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub payment_type: String,
    pub amount: Decimal,
    pub method: String,
    pub order_id: Option<DbId>,
    pub vendor_id: Option<DbId>,
    pub purchase_order_id: Option<DbId>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub paid_at: Timestamp,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO. `amount` must already carry the sign of its type.
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub payment_type: String,
    pub amount: Decimal,
    pub method: String,
    pub order_id: Option<DbId>,
    pub vendor_id: Option<DbId>,
    pub purchase_order_id: Option<DbId>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub paid_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
}

/// Optional filters for payment listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentFilter {
    pub payment_type: Option<String>,
    pub method: Option<String>,
    pub order_id: Option<DbId>,
    pub vendor_id: Option<DbId>,
    pub purchase_order_id: Option<DbId>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

/// Request body for paying a vendor against a purchase order.
///
/// `amount` is the positive sum paid; it is stored as a negative outflow.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordVendorPayment {
    pub amount: Decimal,
    pub method: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub paid_at: Option<Timestamp>,
}
