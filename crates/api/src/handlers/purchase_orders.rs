//! Handlers for `/purchase-orders`: draft editing, the send / receive /
//! cancel lifecycle, vendor payments and receipts.
//!
//! Line arithmetic, totals and guards live in `shopdesk_core::purchasing`;
//! the repository applies them inside row-locking transactions. Handlers
//! validate user input first so bad requests never open a transaction.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use shopdesk_core::error::CoreError;
use shopdesk_core::payments::PaymentMethod;
use shopdesk_core::purchasing::{
    compute_line, compute_totals, validate_line, validate_line_count,
    validate_receipt_line_count, validate_totals, PurchaseOrderStatus,
};
use shopdesk_core::search::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use shopdesk_core::types::DbId;
use shopdesk_core::validation::{validate_optional_text, MAX_NOTE_LEN};
use shopdesk_db::models::payment::{Payment, PaymentFilter, RecordVendorPayment};
use shopdesk_db::models::purchase_order::{
    CreatePurchaseOrder, PurchaseOrder, PurchaseOrderDetail, PurchaseOrderFilter,
    PurchaseOrderLineInput, UpdatePurchaseOrder,
};
use shopdesk_db::models::receipt::{Receipt, ReceiptDetail, ReceiveGoods};
use shopdesk_db::repositories::{PaymentRepo, PurchaseOrderRepo, ReceiptRepo, VendorRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /purchase-orders`.
#[derive(Debug, Default, Deserialize)]
pub struct PurchaseOrderListParams {
    pub status: Option<String>,
    pub vendor_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/purchase-orders
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(params): Query<PurchaseOrderListParams>,
) -> AppResult<Json<DataResponse<Vec<PurchaseOrder>>>> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<PurchaseOrderStatus>)
        .transpose()?;
    let filter = PurchaseOrderFilter {
        status: status.map(|s| s.as_str().to_string()),
        vendor_id: params.vendor_id,
    };
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(params.offset);

    let orders = PurchaseOrderRepo::list(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse::new(orders)))
}

/// POST /api/v1/purchase-orders
///
/// Creates a draft with computed line costs and totals.
pub async fn create_purchase_order(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Json(input): Json<CreatePurchaseOrder>,
) -> AppResult<(StatusCode, Json<DataResponse<PurchaseOrderDetail>>)> {
    validate_lines(&input.items)?;
    validate_optional_text(input.notes.as_deref(), "Notes", MAX_NOTE_LEN)?;
    ensure_vendor_exists(&state, input.vendor_id).await?;

    let detail = PurchaseOrderRepo::create(&state.pool, &input, Some(user.user_id)).await?;
    tracing::info!(
        purchase_order_id = detail.order.id,
        po_number = %detail.order.po_number,
        total = %detail.order.total,
        created_by = user.user_id,
        "Purchase order created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(detail))))
}

/// GET /api/v1/purchase-orders/{id}
///
/// The order with its lines, balance, payment status and shipping status.
pub async fn get_purchase_order(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PurchaseOrderDetail>>> {
    let detail = PurchaseOrderRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PurchaseOrder",
            id,
        }))?;
    Ok(Json(DataResponse::new(detail)))
}

/// PUT /api/v1/purchase-orders/{id}
///
/// Drafts only. Supplying `items` replaces every line.
pub async fn update_purchase_order(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePurchaseOrder>,
) -> AppResult<Json<DataResponse<PurchaseOrderDetail>>> {
    if let Some(items) = &input.items {
        validate_lines(items)?;
    }
    validate_optional_text(input.notes.as_deref(), "Notes", MAX_NOTE_LEN)?;
    if let Some(vendor_id) = input.vendor_id {
        ensure_vendor_exists(&state, vendor_id).await?;
    }

    let detail = PurchaseOrderRepo::update(&state.pool, id, &input).await?;
    tracing::info!(purchase_order_id = id, updated_by = user.user_id, "Purchase order updated");
    Ok(Json(DataResponse::new(detail)))
}

/// DELETE /api/v1/purchase-orders/{id}
pub async fn delete_purchase_order(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    PurchaseOrderRepo::delete(&state.pool, id).await?;
    tracing::info!(purchase_order_id = id, deleted_by = user.user_id, "Purchase order deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/purchase-orders/{id}/send
pub async fn send_purchase_order(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PurchaseOrder>>> {
    let order = PurchaseOrderRepo::send(&state.pool, id).await?;
    tracing::info!(purchase_order_id = id, sent_by = user.user_id, "Purchase order sent");
    Ok(Json(DataResponse::new(order)))
}

/// POST /api/v1/purchase-orders/{id}/cancel
pub async fn cancel_purchase_order(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PurchaseOrder>>> {
    let order = PurchaseOrderRepo::cancel(&state.pool, id).await?;
    tracing::info!(purchase_order_id = id, cancelled_by = user.user_id, "Purchase order cancelled");
    Ok(Json(DataResponse::new(order)))
}

/// POST /api/v1/purchase-orders/{id}/receive
///
/// Records a receipt, adds the quantities to stock and moves the order to
/// `partial` or `received`.
pub async fn receive_goods(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<ReceiveGoods>,
) -> AppResult<(StatusCode, Json<DataResponse<ReceiptDetail>>)> {
    validate_receipt_line_count(input.items.len())?;
    validate_optional_text(input.notes.as_deref(), "Notes", MAX_NOTE_LEN)?;

    let receipt = PurchaseOrderRepo::receive(&state.pool, id, &input, Some(user.user_id)).await?;
    tracing::info!(
        purchase_order_id = id,
        receipt_id = receipt.receipt.id,
        receipt_number = %receipt.receipt.receipt_number,
        lines = receipt.items.len(),
        received_by = user.user_id,
        "Goods received"
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(receipt))))
}

/// GET /api/v1/purchase-orders/{id}/payments
pub async fn list_payments(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Payment>>>> {
    ensure_purchase_order_exists(&state, id).await?;
    let filter = PaymentFilter {
        purchase_order_id: Some(id),
        ..PaymentFilter::default()
    };
    let (limit, offset) = page.resolve();
    let payments = PaymentRepo::list(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse::new(payments)))
}

/// POST /api/v1/purchase-orders/{id}/payments
///
/// Pays the vendor. The amount is a positive magnitude and may not exceed
/// the outstanding balance; it is stored as a negative `vendor` payment.
pub async fn record_payment(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<RecordVendorPayment>,
) -> AppResult<(StatusCode, Json<DataResponse<Payment>>)> {
    let method = input.method.parse::<PaymentMethod>()?;
    validate_optional_text(input.reference.as_deref(), "Reference", MAX_NOTE_LEN)?;
    validate_optional_text(input.notes.as_deref(), "Notes", MAX_NOTE_LEN)?;
    let input = RecordVendorPayment {
        method: method.as_str().to_string(),
        ..input
    };

    let payment =
        PurchaseOrderRepo::record_payment(&state.pool, id, &input, Some(user.user_id)).await?;
    tracing::info!(
        purchase_order_id = id,
        payment_id = payment.id,
        amount = %input.amount,
        paid_by = user.user_id,
        "Vendor payment recorded"
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(payment))))
}

/// GET /api/v1/purchase-orders/{id}/receipts
pub async fn list_receipts(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Receipt>>>> {
    ensure_purchase_order_exists(&state, id).await?;
    let (limit, offset) = page.resolve();
    let receipts = ReceiptRepo::list(&state.pool, Some(id), limit, offset).await?;
    Ok(Json(DataResponse::new(receipts)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_lines(lines: &[PurchaseOrderLineInput]) -> Result<(), CoreError> {
    validate_line_count(lines.len())?;
    for (idx, line) in lines.iter().enumerate() {
        validate_line(line.quantity, line.unit_cost, line.tax_rate, line.shipping).map_err(
            |e| match e {
                CoreError::Validation(msg) => {
                    CoreError::Validation(format!("Line {}: {msg}", idx + 1))
                }
                other => other,
            },
        )?;
    }
    let costs: Vec<_> = lines
        .iter()
        .map(|l| compute_line(l.quantity, l.unit_cost, l.tax_rate, l.shipping))
        .collect();
    validate_totals(&compute_totals(&costs))
}

async fn ensure_vendor_exists(state: &AppState, vendor_id: DbId) -> AppResult<()> {
    if VendorRepo::find_by_id(&state.pool, vendor_id).await?.is_none() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Vendor {vendor_id} does not exist"
        ))));
    }
    Ok(())
}

async fn ensure_purchase_order_exists(state: &AppState, id: DbId) -> AppResult<()> {
    if PurchaseOrderRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "PurchaseOrder",
            id,
        }));
    }
    Ok(())
}
