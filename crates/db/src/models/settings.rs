//! Store settings (single row).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopdesk_core::types::Timestamp;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoreSettings {
    pub store_name: String,
    pub currency: String,
    /// Percent applied to storefront and POS sales.
    pub default_tax_rate: Decimal,
    pub flat_shipping_fee: Decimal,
    /// Points earned per whole currency unit spent.
    pub loyalty_points_per_unit: i32,
    /// Discount value of a single point.
    pub loyalty_point_value: Decimal,
    pub invoice_due_days: i32,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStoreSettings {
    pub store_name: Option<String>,
    pub currency: Option<String>,
    pub default_tax_rate: Option<Decimal>,
    pub flat_shipping_fee: Option<Decimal>,
    pub loyalty_points_per_unit: Option<i32>,
    pub loyalty_point_value: Option<Decimal>,
    pub invoice_due_days: Option<i32>,
}
