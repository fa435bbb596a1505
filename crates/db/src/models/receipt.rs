//! Receipt (goods received) models and DTOs.

use serde::{Deserialize, Serialize};
use shopdesk_core::types::{DbId, Timestamp};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Receipt {
    pub id: DbId,
    pub receipt_number: String,
    pub purchase_order_id: DbId,
    pub received_at: Timestamp,
    pub notes: Option<String>,
    pub received_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReceiptItem {
    pub id: DbId,
    pub receipt_id: DbId,
    pub purchase_order_item_id: DbId,
    pub product_id: DbId,
    pub quantity: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A receipt with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptDetail {
    #[serde(flatten)]
    pub receipt: Receipt,
    pub items: Vec<ReceiptItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiveLine {
    pub purchase_order_item_id: DbId,
    pub quantity: i32,
}

/// Request body for receiving goods against a purchase order.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiveGoods {
    pub items: Vec<ReceiveLine>,
    pub notes: Option<String>,
}
