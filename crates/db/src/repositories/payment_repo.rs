//! Repository for the `payments` table.

use shopdesk_core::payments::{self, PaymentType};
use shopdesk_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;
use crate::models::payment::{CreatePayment, Payment, PaymentFilter};

pub(crate) const COLUMNS: &str = "id, payment_type, amount, method, order_id, vendor_id, \
     purchase_order_id, reference, notes, paid_at, created_by, created_at, updated_at";

pub struct PaymentRepo;

impl PaymentRepo {
    pub async fn create(pool: &PgPool, input: &CreatePayment) -> Result<Payment, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::insert(&mut conn, input).await
    }

    /// Insert a payment on an existing connection or transaction.
    pub(crate) async fn insert(
        conn: &mut PgConnection,
        input: &CreatePayment,
    ) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments
                (payment_type, amount, method, order_id, vendor_id, purchase_order_id,
                 reference, notes, paid_at, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, NOW()), $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(&input.payment_type)
            .bind(input.amount)
            .bind(&input.method)
            .bind(input.order_id)
            .bind(input.vendor_id)
            .bind(input.purchase_order_id)
            .bind(&input.reference)
            .bind(&input.notes)
            .bind(input.paid_at)
            .bind(input.created_by)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE id = $1");
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List payments, most recent first.
    pub async fn list(
        pool: &PgPool,
        filter: &PaymentFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments
             WHERE ($1::TEXT IS NULL OR payment_type = $1)
               AND ($2::TEXT IS NULL OR method = $2)
               AND ($3::BIGINT IS NULL OR order_id = $3)
               AND ($4::BIGINT IS NULL OR vendor_id = $4)
               AND ($5::BIGINT IS NULL OR purchase_order_id = $5)
               AND ($6::TIMESTAMPTZ IS NULL OR paid_at >= $6)
               AND ($7::TIMESTAMPTZ IS NULL OR paid_at < $7)
             ORDER BY paid_at DESC, id DESC
             LIMIT $8 OFFSET $9"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(&filter.payment_type)
            .bind(&filter.method)
            .bind(filter.order_id)
            .bind(filter.vendor_id)
            .bind(filter.purchase_order_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Delete a standalone payment. A vendor payment also reduces the amount
    /// paid on its purchase order.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;
        let query = format!("SELECT {COLUMNS} FROM payments WHERE id = $1 FOR UPDATE");
        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Payment", id))?;
        let kind = payment.payment_type.parse::<PaymentType>()?;
        payments::ensure_deletable(kind)?;

        if let Some(po_id) = payment.purchase_order_id {
            // Vendor amounts are stored negative.
            sqlx::query("UPDATE purchase_orders SET amount_paid = amount_paid + $2 WHERE id = $1")
                .bind(po_id)
                .bind(payment.amount)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
