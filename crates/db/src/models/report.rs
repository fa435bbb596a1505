//! Aggregate rows returned by report queries.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shopdesk_core::types::DbId;
use sqlx::FromRow;

/// Signed payment total for one payment type.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentTypeTotal {
    pub payment_type: String,
    pub total: Decimal,
}

/// Expense total for one category.
#[derive(Debug, Clone, FromRow)]
pub struct CategoryTotalRow {
    pub category_id: DbId,
    pub name: String,
    pub kind: String,
    pub color: String,
    pub total: Decimal,
}

/// Sales totals for one calendar day (UTC).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DailySales {
    pub day: NaiveDate,
    pub order_count: i64,
    pub total: Decimal,
}

/// Purchase order counts and money per status.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PurchaseOrderStatusTotal {
    pub status: String,
    pub order_count: i64,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub balance: Decimal,
}
