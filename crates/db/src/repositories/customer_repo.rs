//! Repository for the `customers` table.

use shopdesk_core::csv::CustomerCsvRow;
use shopdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::customer::{CreateCustomer, Customer, UpdateCustomer, UpsertOutcome};

pub(crate) const COLUMNS: &str =
    "id, name, email, phone, address, loyalty_points, notes, created_at, updated_at";

pub struct CustomerRepo;

impl CustomerRepo {
    pub async fn create(pool: &PgPool, input: &CreateCustomer) -> Result<Customer, sqlx::Error> {
        let query = format!(
            "INSERT INTO customers (name, email, phone, address, notes)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    /// Find a customer by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Customer>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM customers WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List customers ordered by name, optionally filtered by a
    /// case-insensitive match on name, email or phone.
    pub async fn list(
        pool: &PgPool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Customer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM customers
             WHERE deleted_at IS NULL
               AND ($1::TEXT IS NULL
                    OR name ILIKE '%' || $1 || '%'
                    OR email ILIKE '%' || $1 || '%'
                    OR phone ILIKE '%' || $1 || '%')
             ORDER BY name ASC, id ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Every live customer, for CSV export.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Customer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM customers WHERE deleted_at IS NULL ORDER BY id ASC"
        );
        sqlx::query_as::<_, Customer>(&query).fetch_all(pool).await
    }

    /// Update a customer. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCustomer,
    ) -> Result<Option<Customer>, sqlx::Error> {
        let query = format!(
            "UPDATE customers SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                notes = COALESCE($6, notes)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.notes)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a customer. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE customers SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert or update imported rows in one transaction.
    ///
    /// Rows with an email update the customer holding that email; rows
    /// without one are always inserted.
    pub async fn upsert_many(
        pool: &PgPool,
        rows: &[CustomerCsvRow],
    ) -> Result<Vec<UpsertOutcome>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut outcomes = Vec::with_capacity(rows.len());

        for row in rows {
            // xmax = 0 only for freshly inserted tuples.
            let inserted: bool = sqlx::query_scalar(
                "INSERT INTO customers (name, email, phone, address, notes)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (email) DO UPDATE SET
                    name = EXCLUDED.name,
                    phone = COALESCE(EXCLUDED.phone, customers.phone),
                    address = COALESCE(EXCLUDED.address, customers.address),
                    notes = COALESCE(EXCLUDED.notes, customers.notes),
                    deleted_at = NULL
                 RETURNING (xmax = 0)",
            )
            .bind(&row.name)
            .bind(&row.email)
            .bind(&row.phone)
            .bind(&row.address)
            .bind(&row.notes)
            .fetch_one(&mut *tx)
            .await?;
            outcomes.push(if inserted {
                UpsertOutcome::Created
            } else {
                UpsertOutcome::Updated
            });
        }

        tx.commit().await?;
        Ok(outcomes)
    }
}
