//! Repository for `invoices`.

use chrono::Utc;
use shopdesk_core::error::CoreError;
use shopdesk_core::invoicing::{self, InvoiceStatus};
use shopdesk_core::numbering::{document_number, INVOICE_PREFIX};
use shopdesk_core::orders::OrderStatus;
use shopdesk_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;
use crate::models::invoice::{CreateInvoice, Invoice, InvoiceFilter};
use crate::repositories::settings_repo::SettingsRepo;

const COLUMNS: &str = "id, invoice_number, order_id, customer_id, amount, status, issued_at, \
     due_at, paid_at, notes, created_by, created_at, updated_at";

pub struct InvoiceRepo;

impl InvoiceRepo {
    /// Create a draft invoice for the full order total.
    ///
    /// A second live invoice for the same order violates
    /// `uq_invoices_order_id_active`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateInvoice,
        created_by: Option<DbId>,
    ) -> Result<Invoice, DbError> {
        let mut tx = pool.begin().await?;

        let order: Option<(String, Option<DbId>, rust_decimal::Decimal)> = sqlx::query_as(
            "SELECT status, customer_id, total FROM orders WHERE id = $1 FOR UPDATE",
        )
        .bind(input.order_id)
        .fetch_optional(&mut *tx)
        .await?;
        let (status, customer_id, total) =
            order.ok_or_else(|| DbError::not_found("Order", input.order_id))?;
        if status.parse::<OrderStatus>()? == OrderStatus::Refunded {
            return Err(CoreError::Conflict(format!(
                "Order {} has been refunded and cannot be invoiced",
                input.order_id
            ))
            .into());
        }

        let id: DbId =
            sqlx::query_scalar("SELECT nextval(pg_get_serial_sequence('invoices', 'id'))")
                .fetch_one(&mut *tx)
                .await?;
        let query = format!(
            "INSERT INTO invoices (id, invoice_number, order_id, customer_id, amount, notes, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let invoice = sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .bind(document_number(INVOICE_PREFIX, id))
            .bind(input.order_id)
            .bind(customer_id)
            .bind(total)
            .bind(&input.notes)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(invoice)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Invoice>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM invoices WHERE id = $1");
        sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &InvoiceFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Invoice>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM invoices
             WHERE ($1::TEXT IS NULL OR status = $1)
               AND ($2::BIGINT IS NULL OR customer_id = $2)
               AND ($3::BIGINT IS NULL OR order_id = $3)
             ORDER BY created_at DESC, id DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Invoice>(&query)
            .bind(&filter.status)
            .bind(filter.customer_id)
            .bind(filter.order_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Issue a draft. The due date follows the store's payment terms.
    pub async fn issue(pool: &PgPool, id: DbId) -> Result<Invoice, DbError> {
        let mut tx = pool.begin().await?;
        let status = lock_status(&mut tx, id).await?;
        invoicing::ensure_transition(status, InvoiceStatus::Issued)?;

        let settings = SettingsRepo::get_with(&mut *tx).await?;
        let issued_at = Utc::now();
        let due_at = invoicing::due_date(issued_at, settings.invoice_due_days);

        let query = format!(
            "UPDATE invoices SET status = $2, issued_at = $3, due_at = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let invoice = sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .bind(InvoiceStatus::Issued.as_str())
            .bind(issued_at)
            .bind(due_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(invoice)
    }

    /// Mark an issued invoice paid. The money itself is the order's sale payment.
    pub async fn pay(pool: &PgPool, id: DbId) -> Result<Invoice, DbError> {
        let mut tx = pool.begin().await?;
        let status = lock_status(&mut tx, id).await?;
        invoicing::ensure_transition(status, InvoiceStatus::Paid)?;

        let query = format!(
            "UPDATE invoices SET status = $2, paid_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let invoice = sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .bind(InvoiceStatus::Paid.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(invoice)
    }

    pub async fn void(pool: &PgPool, id: DbId) -> Result<Invoice, DbError> {
        let mut tx = pool.begin().await?;
        let status = lock_status(&mut tx, id).await?;
        invoicing::ensure_transition(status, InvoiceStatus::Void)?;

        let query = format!("UPDATE invoices SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        let invoice = sqlx::query_as::<_, Invoice>(&query)
            .bind(id)
            .bind(InvoiceStatus::Void.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(invoice)
    }
}

async fn lock_status(conn: &mut PgConnection, id: DbId) -> Result<InvoiceStatus, DbError> {
    let status: Option<String> =
        sqlx::query_scalar("SELECT status FROM invoices WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    let status = status.ok_or_else(|| DbError::not_found("Invoice", id))?;
    Ok(status.parse()?)
}
