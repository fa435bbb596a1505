//! Handlers for `/invoices`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use shopdesk_core::error::CoreError;
use shopdesk_core::invoicing::InvoiceStatus;
use shopdesk_core::search::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use shopdesk_core::types::DbId;
use shopdesk_core::validation::{validate_optional_text, MAX_NOTE_LEN};
use shopdesk_db::models::invoice::{CreateInvoice, InvoiceFilter, InvoiceView};
use shopdesk_db::repositories::InvoiceRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceListParams {
    pub status: Option<String>,
    pub customer_id: Option<DbId>,
    pub order_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(params): Query<InvoiceListParams>,
) -> AppResult<Json<DataResponse<Vec<InvoiceView>>>> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<InvoiceStatus>)
        .transpose()?;
    let filter = InvoiceFilter {
        status: status.map(|s| s.as_str().to_string()),
        customer_id: params.customer_id,
        order_id: params.order_id,
    };
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(params.offset);

    let now = Utc::now();
    let invoices = InvoiceRepo::list(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse::new(
        invoices
            .into_iter()
            .map(|inv| InvoiceView::new(inv, now))
            .collect(),
    )))
}

/// POST /api/v1/invoices
///
/// Drafts an invoice for the full order total. An order has at most one
/// invoice that is not void.
pub async fn create_invoice(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Json(input): Json<CreateInvoice>,
) -> AppResult<(StatusCode, Json<DataResponse<InvoiceView>>)> {
    validate_optional_text(input.notes.as_deref(), "Notes", MAX_NOTE_LEN)?;

    let invoice = InvoiceRepo::create(&state.pool, &input, Some(user.user_id)).await?;
    tracing::info!(
        invoice_id = invoice.id,
        invoice_number = %invoice.invoice_number,
        order_id = invoice.order_id,
        created_by = user.user_id,
        "Invoice created"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(InvoiceView::new(invoice, Utc::now()))),
    ))
}

/// GET /api/v1/invoices/{id}
pub async fn get_invoice(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<InvoiceView>>> {
    let invoice = InvoiceRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Invoice",
            id,
        }))?;
    Ok(Json(DataResponse::new(InvoiceView::new(invoice, Utc::now()))))
}

/// POST /api/v1/invoices/{id}/issue
///
/// Stamps the issue date and the due date from the configured terms.
pub async fn issue_invoice(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<InvoiceView>>> {
    let invoice = InvoiceRepo::issue(&state.pool, id).await?;
    tracing::info!(invoice_id = id, issued_by = user.user_id, "Invoice issued");
    Ok(Json(DataResponse::new(InvoiceView::new(invoice, Utc::now()))))
}

/// POST /api/v1/invoices/{id}/pay
pub async fn pay_invoice(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<InvoiceView>>> {
    let invoice = InvoiceRepo::pay(&state.pool, id).await?;
    tracing::info!(invoice_id = id, updated_by = user.user_id, "Invoice marked paid");
    Ok(Json(DataResponse::new(InvoiceView::new(invoice, Utc::now()))))
}

/// POST /api/v1/invoices/{id}/void
pub async fn void_invoice(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<InvoiceView>>> {
    let invoice = InvoiceRepo::void(&state.pool, id).await?;
    tracing::info!(invoice_id = id, voided_by = user.user_id, "Invoice voided");
    Ok(Json(DataResponse::new(InvoiceView::new(invoice, Utc::now()))))
}
