//! Product entity model and DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopdesk_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A product row from the `products` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub cost: Decimal,
    pub stock_quantity: i32,
    pub reorder_level: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub cost: Option<Decimal>,
    /// Opening stock. Later changes go through stock adjustments or receiving.
    pub stock_quantity: Option<i32>,
    pub reorder_level: Option<i32>,
    pub is_active: Option<bool>,
}

/// Partial update. Stock is not editable here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub reorder_level: Option<i32>,
    pub is_active: Option<bool>,
}

/// Optional filters for product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive match on name or SKU.
    pub search: Option<String>,
    pub category: Option<String>,
    /// Restrict to active products (the storefront always sets this).
    pub active_only: bool,
}
