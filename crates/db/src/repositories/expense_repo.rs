//! Repository for the `expenses` table.
//!
//! Each expense owns one outflow payment of type `expense`. Both rows are
//! created, updated and deleted together.

use shopdesk_core::payments::PaymentType;
use shopdesk_core::types::DbId;
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::expense::{CreateExpense, Expense, ExpenseFilter, UpdateExpense};
use crate::models::payment::CreatePayment;
use crate::repositories::payment_repo::PaymentRepo;

const COLUMNS: &str = "id, category_id, description, amount, method, vendor_id, incurred_on, \
     payment_id, notes, created_by, created_at, updated_at";

pub struct ExpenseRepo;

impl ExpenseRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateExpense,
        created_by: Option<DbId>,
    ) -> Result<Expense, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let incurred_on = input
            .incurred_on
            .unwrap_or_else(|| chrono::Utc::now().date_naive());
        let payment = PaymentRepo::insert(
            &mut tx,
            &CreatePayment {
                payment_type: PaymentType::Expense.as_str().to_string(),
                amount: -input.amount.abs(),
                method: input.method.clone(),
                order_id: None,
                vendor_id: input.vendor_id,
                purchase_order_id: None,
                reference: None,
                notes: Some(input.description.clone()),
                paid_at: incurred_on.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
                created_by,
            },
        )
        .await?;

        let query = format!(
            "INSERT INTO expenses
                (category_id, description, amount, method, vendor_id, incurred_on,
                 payment_id, notes, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        let expense = sqlx::query_as::<_, Expense>(&query)
            .bind(input.category_id)
            .bind(&input.description)
            .bind(input.amount)
            .bind(&input.method)
            .bind(input.vendor_id)
            .bind(incurred_on)
            .bind(payment.id)
            .bind(&input.notes)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(expense)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Expense>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM expenses WHERE id = $1");
        sqlx::query_as::<_, Expense>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List expenses, most recent first. Date bounds are inclusive.
    pub async fn list(
        pool: &PgPool,
        filter: &ExpenseFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Expense>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM expenses
             WHERE ($1::BIGINT IS NULL OR category_id = $1)
               AND ($2::BIGINT IS NULL OR vendor_id = $2)
               AND ($3::DATE IS NULL OR incurred_on >= $3)
               AND ($4::DATE IS NULL OR incurred_on <= $4)
             ORDER BY incurred_on DESC, id DESC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, Expense>(&query)
            .bind(filter.category_id)
            .bind(filter.vendor_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update an expense and mirror amount, method, vendor and date onto its payment.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateExpense,
    ) -> Result<Option<Expense>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE expenses SET
                category_id = COALESCE($2, category_id),
                description = COALESCE($3, description),
                amount = COALESCE($4, amount),
                method = COALESCE($5, method),
                vendor_id = COALESCE($6, vendor_id),
                incurred_on = COALESCE($7, incurred_on),
                notes = COALESCE($8, notes)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let Some(expense) = sqlx::query_as::<_, Expense>(&query)
            .bind(id)
            .bind(input.category_id)
            .bind(&input.description)
            .bind(input.amount)
            .bind(&input.method)
            .bind(input.vendor_id)
            .bind(input.incurred_on)
            .bind(&input.notes)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        if let Some(payment_id) = expense.payment_id {
            sqlx::query(
                "UPDATE payments SET
                    amount = $2,
                    method = $3,
                    vendor_id = $4,
                    notes = $5,
                    paid_at = $6::DATE::TIMESTAMP AT TIME ZONE 'UTC'
                 WHERE id = $1",
            )
            .bind(payment_id)
            .bind(-expense.amount)
            .bind(&expense.method)
            .bind(expense.vendor_id)
            .bind(&expense.description)
            .bind(expense.incurred_on)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(expense))
    }

    /// Delete an expense together with its payment.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;
        let payment_id: Option<Option<DbId>> =
            sqlx::query_scalar("DELETE FROM expenses WHERE id = $1 RETURNING payment_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let payment_id = payment_id.ok_or_else(|| DbError::not_found("Expense", id))?;

        if let Some(payment_id) = payment_id {
            sqlx::query("DELETE FROM payments WHERE id = $1")
                .bind(payment_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
