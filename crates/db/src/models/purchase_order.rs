//! Purchase order, line item models and DTOs.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopdesk_core::purchasing::{self, PaymentStatus, ReceivingLine, ShippingStatus};
use shopdesk_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A purchase order row from the `purchase_orders` table.
///
/// `status` holds a [`PurchaseOrderStatus`](shopdesk_core::purchasing::PurchaseOrderStatus)
/// value; the totals are recomputed from the lines whenever the lines change.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PurchaseOrder {
    pub id: DbId,
    pub po_number: String,
    pub vendor_id: DbId,
    pub status: String,
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub shipping_total: Decimal,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub ordered_at: Option<Timestamp>,
    pub expected_at: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A line item row from the `purchase_order_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PurchaseOrderItem {
    pub id: DbId,
    pub purchase_order_id: DbId,
    pub product_id: DbId,
    pub line_no: i32,
    pub quantity_ordered: i32,
    pub quantity_received: i32,
    pub unit_cost: Decimal,
    pub tax_rate: Decimal,
    pub shipping: Decimal,
    pub cost_excl_tax: Decimal,
    pub total_tax: Decimal,
    pub cost_incl_tax: Decimal,
    pub total_price: Decimal,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PurchaseOrderItem {
    pub fn receiving(&self) -> ReceivingLine {
        ReceivingLine {
            ordered: self.quantity_ordered,
            received: self.quantity_received,
        }
    }
}

/// One line as entered by the user. Costs are computed server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseOrderLineInput {
    pub product_id: DbId,
    pub quantity: i32,
    pub unit_cost: Decimal,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub shipping: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePurchaseOrder {
    pub vendor_id: DbId,
    pub expected_at: Option<NaiveDate>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<PurchaseOrderLineInput>,
}

/// Partial update of a draft. When `items` is present it replaces every line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePurchaseOrder {
    pub vendor_id: Option<DbId>,
    pub expected_at: Option<NaiveDate>,
    pub notes: Option<String>,
    pub items: Option<Vec<PurchaseOrderLineInput>>,
}

/// Optional filters for purchase order listings.
#[derive(Debug, Clone, Default)]
pub struct PurchaseOrderFilter {
    pub status: Option<String>,
    pub vendor_id: Option<DbId>,
}

/// A purchase order with its lines and derived balance and statuses.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub balance: Decimal,
    pub payment_status: PaymentStatus,
    pub shipping_status: ShippingStatus,
    pub items: Vec<PurchaseOrderItem>,
}

impl PurchaseOrderDetail {
    pub fn new(order: PurchaseOrder, items: Vec<PurchaseOrderItem>) -> Self {
        let receiving: Vec<ReceivingLine> = items.iter().map(PurchaseOrderItem::receiving).collect();
        Self {
            balance: purchasing::balance(order.total, order.amount_paid),
            payment_status: purchasing::payment_status(order.total, order.amount_paid),
            shipping_status: purchasing::shipping_status(&receiving),
            order,
            items,
        }
    }
}
