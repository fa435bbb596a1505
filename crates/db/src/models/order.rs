//! Sales order models and DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopdesk_core::orders::CartRequest;
use shopdesk_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A sales order row from the `orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub order_number: String,
    pub customer_id: Option<DbId>,
    pub channel: String,
    pub status: String,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub points_redeemed: i64,
    pub points_earned: i64,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An order line. Name, SKU and price are snapshots taken at sale time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItem {
    pub id: DbId,
    pub order_id: DbId,
    pub product_id: DbId,
    pub product_name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Everything needed to record a paid sale in one transaction.
///
/// Prices, tax and the shipping fee are resolved inside the transaction
/// from the product rows and store settings.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub customer_id: Option<DbId>,
    /// `online` or `pos`.
    pub channel: String,
    /// Status the order starts in (`paid` online, `completed` at the POS).
    pub status: String,
    pub lines: Vec<CartRequest>,
    pub points_to_redeem: i64,
    /// Additional manual discount (POS only).
    pub manual_discount: Decimal,
    pub charge_shipping: bool,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub method: String,
    /// Processor reference stored on the sale payment.
    pub reference: Option<String>,
    pub created_by: Option<DbId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
    pub channel: Option<String>,
    pub customer_id: Option<DbId>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

/// Request body for refunding an order.
///
/// When `method` is omitted the refund goes back through the method of the
/// original sale payment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefundOrder {
    pub method: Option<String>,
    pub notes: Option<String>,
}
