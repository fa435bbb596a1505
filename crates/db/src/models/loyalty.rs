//! Loyalty ledger model and DTOs.

use serde::{Deserialize, Serialize};
use shopdesk_core::types::{DbId, Timestamp};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LoyaltyTransaction {
    pub id: DbId,
    pub customer_id: DbId,
    pub order_id: Option<DbId>,
    pub points: i64,
    pub reason: String,
    pub note: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Current balance plus recent ledger entries.
#[derive(Debug, Clone, Serialize)]
pub struct LoyaltySummary {
    pub customer_id: DbId,
    pub balance: i64,
    pub transactions: Vec<LoyaltyTransaction>,
}

/// Request body for a manual balance adjustment.
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustLoyalty {
    pub points: i64,
    pub note: Option<String>,
}
