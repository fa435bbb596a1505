//! Repository for `loyalty_transactions` and customer point balances.

use shopdesk_core::loyalty::{self, LoyaltyReason};
use shopdesk_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;
use crate::models::loyalty::{AdjustLoyalty, LoyaltySummary, LoyaltyTransaction};

const COLUMNS: &str =
    "id, customer_id, order_id, points, reason, note, created_by, created_at, updated_at";

/// How many ledger entries a summary includes.
const SUMMARY_HISTORY: i64 = 50;

pub struct LoyaltyRepo;

impl LoyaltyRepo {
    /// Balance and most recent ledger entries, or `None` for an unknown customer.
    pub async fn summary(
        pool: &PgPool,
        customer_id: DbId,
    ) -> Result<Option<LoyaltySummary>, sqlx::Error> {
        let balance: Option<i64> = sqlx::query_scalar(
            "SELECT loyalty_points FROM customers WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(customer_id)
        .fetch_optional(pool)
        .await?;
        let Some(balance) = balance else {
            return Ok(None);
        };

        let query = format!(
            "SELECT {COLUMNS} FROM loyalty_transactions
             WHERE customer_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        let transactions = sqlx::query_as::<_, LoyaltyTransaction>(&query)
            .bind(customer_id)
            .bind(SUMMARY_HISTORY)
            .fetch_all(pool)
            .await?;

        Ok(Some(LoyaltySummary {
            customer_id,
            balance,
            transactions,
        }))
    }

    /// Apply a manual adjustment. The balance may not go below zero.
    pub async fn adjust(
        pool: &PgPool,
        customer_id: DbId,
        input: &AdjustLoyalty,
        created_by: Option<DbId>,
    ) -> Result<LoyaltyTransaction, DbError> {
        let mut tx = pool.begin().await?;
        let balance = lock_balance(&mut tx, customer_id).await?;
        let new_balance = loyalty::validate_adjustment(balance, input.points)?;

        let entry = Self::insert(
            &mut tx,
            customer_id,
            None,
            input.points,
            LoyaltyReason::Adjustment,
            input.note.as_deref(),
            created_by,
        )
        .await?;
        set_balance(&mut tx, customer_id, new_balance).await?;

        tx.commit().await?;
        Ok(entry)
    }

    /// Append a ledger entry on an existing transaction.
    pub(crate) async fn insert(
        conn: &mut PgConnection,
        customer_id: DbId,
        order_id: Option<DbId>,
        points: i64,
        reason: LoyaltyReason,
        note: Option<&str>,
        created_by: Option<DbId>,
    ) -> Result<LoyaltyTransaction, sqlx::Error> {
        let query = format!(
            "INSERT INTO loyalty_transactions (customer_id, order_id, points, reason, note, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LoyaltyTransaction>(&query)
            .bind(customer_id)
            .bind(order_id)
            .bind(points)
            .bind(reason.as_str())
            .bind(note)
            .bind(created_by)
            .fetch_one(&mut *conn)
            .await
    }
}

/// Lock a live customer row and return its current balance.
pub(crate) async fn lock_balance(
    conn: &mut PgConnection,
    customer_id: DbId,
) -> Result<i64, DbError> {
    let balance: Option<i64> = sqlx::query_scalar(
        "SELECT loyalty_points FROM customers
         WHERE id = $1 AND deleted_at IS NULL
         FOR UPDATE",
    )
    .bind(customer_id)
    .fetch_optional(&mut *conn)
    .await?;
    balance.ok_or_else(|| DbError::not_found("Customer", customer_id))
}

pub(crate) async fn set_balance(
    conn: &mut PgConnection,
    customer_id: DbId,
    balance: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE customers SET loyalty_points = $2 WHERE id = $1")
        .bind(customer_id)
        .bind(balance)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
