//! Aggregate queries behind the financial reports.

use chrono::NaiveDate;
use shopdesk_core::payments::PaymentType;
use shopdesk_core::reports::{self, CategoryTotal, ExpenseBreakdown, FinancialSummary};
use shopdesk_core::types::Timestamp;
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::report::{CategoryTotalRow, DailySales, PaymentTypeTotal, PurchaseOrderStatusTotal};

pub struct ReportRepo;

impl ReportRepo {
    /// Signed payment totals per type within `[start, end)`.
    pub async fn payment_totals(
        pool: &PgPool,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<PaymentTypeTotal>, sqlx::Error> {
        sqlx::query_as::<_, PaymentTypeTotal>(
            "SELECT payment_type, SUM(amount) AS total
             FROM payments
             WHERE paid_at >= $1 AND paid_at < $2
             GROUP BY payment_type
             ORDER BY payment_type",
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }

    /// Orders placed within `[start, end)`, refunded ones included.
    pub async fn order_count(
        pool: &PgPool,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE created_at >= $1 AND created_at < $2")
            .bind(start)
            .bind(end)
            .fetch_one(pool)
            .await
    }

    pub async fn financial_summary(
        pool: &PgPool,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<FinancialSummary, DbError> {
        reports::validate_period(from, to)?;
        let (start, end) = reports::period_bounds(from, to);
        let rows = Self::payment_totals(pool, start, end).await?;
        let order_count = Self::order_count(pool, start, end).await?;

        let totals = rows
            .into_iter()
            .map(|row| Ok((row.payment_type.parse::<PaymentType>()?, row.total)))
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(FinancialSummary::from_totals(&totals, order_count))
    }

    /// Expense totals per category for expenses incurred in `from..=to`.
    pub async fn category_totals(
        pool: &PgPool,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CategoryTotalRow>, sqlx::Error> {
        sqlx::query_as::<_, CategoryTotalRow>(
            "SELECT c.id AS category_id, c.name, c.kind, c.color, SUM(e.amount) AS total
             FROM expenses e
             JOIN expense_categories c ON c.id = e.category_id
             WHERE e.incurred_on BETWEEN $1 AND $2
             GROUP BY c.id, c.name, c.kind, c.color",
        )
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    pub async fn expense_breakdown(
        pool: &PgPool,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ExpenseBreakdown, DbError> {
        reports::validate_period(from, to)?;
        let rows = Self::category_totals(pool, from, to).await?;
        let totals = rows
            .into_iter()
            .map(|row| {
                Ok(CategoryTotal {
                    category_id: row.category_id,
                    kind: row.kind.parse()?,
                    name: row.name,
                    color: row.color,
                    total: row.total,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(reports::expense_breakdown(totals))
    }

    /// Non-refunded sales per UTC day in `from..=to`.
    pub async fn sales_by_day(
        pool: &PgPool,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailySales>, DbError> {
        reports::validate_period(from, to)?;
        let (start, end) = reports::period_bounds(from, to);
        Ok(sqlx::query_as::<_, DailySales>(
            "SELECT (created_at AT TIME ZONE 'UTC')::DATE AS day,
                    COUNT(*) AS order_count,
                    SUM(total) AS total
             FROM orders
             WHERE created_at >= $1 AND created_at < $2 AND status <> 'refunded'
             GROUP BY day
             ORDER BY day",
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?)
    }

    /// Purchase order counts, value, payments and open balance per status.
    pub async fn purchase_order_totals(
        pool: &PgPool,
    ) -> Result<Vec<PurchaseOrderStatusTotal>, sqlx::Error> {
        sqlx::query_as::<_, PurchaseOrderStatusTotal>(
            "SELECT status,
                    COUNT(*) AS order_count,
                    COALESCE(SUM(total), 0) AS total,
                    COALESCE(SUM(amount_paid), 0) AS amount_paid,
                    COALESCE(SUM(total - amount_paid), 0) AS balance
             FROM purchase_orders
             GROUP BY status
             ORDER BY status",
        )
        .fetch_all(pool)
        .await
    }
}
