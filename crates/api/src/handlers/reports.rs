//! Handlers for `/reports`. All money figures are in the store currency.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use shopdesk_core::reports::{ExpenseBreakdown, FinancialSummary};
use shopdesk_db::models::purchase_order::PurchaseOrder;
use shopdesk_db::models::report::{DailySales, PurchaseOrderStatusTotal};
use shopdesk_db::repositories::{PurchaseOrderRepo, ReportRepo};

use crate::error::AppResult;
use crate::middleware::rbac::RequireStaff;
use crate::query::PeriodParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// A report body together with the period it covers.
#[derive(Debug, Serialize)]
pub struct PeriodReport<T> {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(flatten)]
    pub report: T,
}

#[derive(Debug, Serialize)]
pub struct DailySalesReport {
    pub days: Vec<DailySales>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseOrderReport {
    pub by_status: Vec<PurchaseOrderStatusTotal>,
    /// Sent or partially received orders past their expected date.
    pub overdue: Vec<PurchaseOrder>,
}

/// GET /api/v1/reports/summary?from=&to=
pub async fn financial_summary(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(period): Query<PeriodParams>,
) -> AppResult<Json<DataResponse<PeriodReport<FinancialSummary>>>> {
    let report = ReportRepo::financial_summary(&state.pool, period.from, period.to).await?;
    Ok(Json(DataResponse::new(PeriodReport {
        from: period.from,
        to: period.to,
        report,
    })))
}

/// GET /api/v1/reports/expenses-by-category?from=&to=
pub async fn expenses_by_category(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(period): Query<PeriodParams>,
) -> AppResult<Json<DataResponse<PeriodReport<ExpenseBreakdown>>>> {
    let report = ReportRepo::expense_breakdown(&state.pool, period.from, period.to).await?;
    Ok(Json(DataResponse::new(PeriodReport {
        from: period.from,
        to: period.to,
        report,
    })))
}

/// GET /api/v1/reports/sales-by-day?from=&to=
///
/// Days without sales are omitted. Refunded orders are excluded.
pub async fn sales_by_day(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(period): Query<PeriodParams>,
) -> AppResult<Json<DataResponse<PeriodReport<DailySalesReport>>>> {
    let days = ReportRepo::sales_by_day(&state.pool, period.from, period.to).await?;
    Ok(Json(DataResponse::new(PeriodReport {
        from: period.from,
        to: period.to,
        report: DailySalesReport { days },
    })))
}

/// GET /api/v1/reports/purchase-orders
pub async fn purchase_orders(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
) -> AppResult<Json<DataResponse<PurchaseOrderReport>>> {
    let by_status = ReportRepo::purchase_order_totals(&state.pool).await?;
    let overdue = PurchaseOrderRepo::list_overdue(&state.pool, Utc::now().date_naive()).await?;
    Ok(Json(DataResponse::new(PurchaseOrderReport { by_status, overdue })))
}
