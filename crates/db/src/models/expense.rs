//! Expense category and expense models and DTOs.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopdesk_core::types::{DbId, Timestamp};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExpenseCategory {
    pub id: DbId,
    pub name: String,
    /// `FIXED` or `VARIABLE`.
    pub kind: String,
    pub color: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateExpenseCategory {
    pub name: String,
    pub kind: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateExpenseCategory {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub color: Option<String>,
}

/// An expense row. `payment_id` links the outflow payment created with it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Expense {
    pub id: DbId,
    pub category_id: DbId,
    pub description: String,
    pub amount: Decimal,
    pub method: String,
    pub vendor_id: Option<DbId>,
    pub incurred_on: NaiveDate,
    pub payment_id: Option<DbId>,
    pub notes: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateExpense {
    pub category_id: DbId,
    pub description: String,
    pub amount: Decimal,
    pub method: String,
    pub vendor_id: Option<DbId>,
    pub incurred_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Partial update. Amount and method changes are mirrored onto the linked payment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateExpense {
    pub category_id: Option<DbId>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub method: Option<String>,
    pub vendor_id: Option<DbId>,
    pub incurred_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseFilter {
    pub category_id: Option<DbId>,
    pub vendor_id: Option<DbId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}
