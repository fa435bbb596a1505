//! Handlers for `/payments`: the signed cash ledger.
//!
//! Sale, refund and expense payments are written by the order and expense
//! flows. This endpoint records vendor payments against a purchase order
//! and free-standing adjustments.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopdesk_core::error::CoreError;
use shopdesk_core::payments::{
    direction, normalize_amount, validate_references, PaymentDirection, PaymentMethod,
    PaymentReferences, PaymentType,
};
use shopdesk_core::search::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use shopdesk_core::types::{DbId, Timestamp};
use shopdesk_core::validation::{validate_optional_text, MAX_NOTE_LEN};
use shopdesk_db::models::payment::{CreatePayment, Payment, PaymentFilter, RecordVendorPayment};
use shopdesk_db::repositories::{PaymentRepo, PurchaseOrderRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::query::timestamp_bounds;
use crate::response::DataResponse;
use crate::state::AppState;

/// A payment with its derived direction.
#[derive(Debug, Serialize)]
pub struct PaymentView {
    #[serde(flatten)]
    pub payment: Payment,
    pub direction: PaymentDirection,
}

impl From<Payment> for PaymentView {
    fn from(payment: Payment) -> Self {
        let direction = direction(payment.amount);
        Self { payment, direction }
    }
}

/// Query parameters for `GET /payments`. `from`/`to` are inclusive dates.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentListParams {
    pub payment_type: Option<String>,
    pub method: Option<String>,
    pub order_id: Option<DbId>,
    pub vendor_id: Option<DbId>,
    pub purchase_order_id: Option<DbId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaymentListParams {
    fn filter(&self) -> Result<PaymentFilter, CoreError> {
        let payment_type = self
            .payment_type
            .as_deref()
            .map(str::parse::<PaymentType>)
            .transpose()?;
        let method = self
            .method
            .as_deref()
            .map(str::parse::<PaymentMethod>)
            .transpose()?;
        let (from, to) = timestamp_bounds(self.from, self.to)?;
        Ok(PaymentFilter {
            payment_type: payment_type.map(|t| t.as_str().to_string()),
            method: method.map(|m| m.as_str().to_string()),
            order_id: self.order_id,
            vendor_id: self.vendor_id,
            purchase_order_id: self.purchase_order_id,
            from,
            to,
        })
    }
}

/// Body of `POST /payments`.
///
/// `amount` is a magnitude for vendor payments and signed for adjustments.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub payment_type: String,
    pub amount: Decimal,
    pub method: String,
    pub vendor_id: Option<DbId>,
    pub purchase_order_id: Option<DbId>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub paid_at: Option<Timestamp>,
}

/// GET /api/v1/payments
pub async fn list_payments(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(params): Query<PaymentListParams>,
) -> AppResult<Json<DataResponse<Vec<PaymentView>>>> {
    let filter = params.filter()?;
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(params.offset);

    let payments = PaymentRepo::list(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse::new(
        payments.into_iter().map(PaymentView::from).collect(),
    )))
}

/// POST /api/v1/payments
pub async fn create_payment(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Json(input): Json<CreatePaymentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<PaymentView>>)> {
    let kind = input.payment_type.parse::<PaymentType>()?;
    let method = input.method.parse::<PaymentMethod>()?;
    validate_optional_text(input.reference.as_deref(), "Reference", MAX_NOTE_LEN)?;
    validate_optional_text(input.notes.as_deref(), "Notes", MAX_NOTE_LEN)?;

    let payment = match kind {
        PaymentType::Vendor => {
            let po_id = input.purchase_order_id.ok_or_else(|| {
                CoreError::Validation("Vendor payments must reference a purchase order".into())
            })?;
            let order = PurchaseOrderRepo::find_by_id(&state.pool, po_id)
                .await?
                .ok_or(AppError::Core(CoreError::NotFound {
                    entity: "PurchaseOrder",
                    id: po_id,
                }))?;
            if input.vendor_id.is_some_and(|v| v != order.vendor_id) {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "Purchase order {} belongs to vendor {}",
                    order.po_number, order.vendor_id
                ))));
            }
            PurchaseOrderRepo::record_payment(
                &state.pool,
                po_id,
                &RecordVendorPayment {
                    amount: input.amount,
                    method: method.as_str().to_string(),
                    reference: input.reference,
                    notes: input.notes,
                    paid_at: input.paid_at,
                },
                Some(user.user_id),
            )
            .await?
        }
        PaymentType::Adjustment => {
            let amount = normalize_amount(kind, input.amount)?;
            validate_references(
                kind,
                &PaymentReferences {
                    order_id: None,
                    vendor_id: input.vendor_id,
                    purchase_order_id: input.purchase_order_id,
                },
            )?;
            PaymentRepo::create(
                &state.pool,
                &CreatePayment {
                    payment_type: kind.as_str().to_string(),
                    amount,
                    method: method.as_str().to_string(),
                    order_id: None,
                    vendor_id: input.vendor_id,
                    purchase_order_id: None,
                    reference: input.reference,
                    notes: input.notes,
                    paid_at: input.paid_at,
                    created_by: Some(user.user_id),
                },
            )
            .await?
        }
        other => {
            return Err(AppError::Core(CoreError::Validation(format!(
                "A {other} payment is recorded through its order or expense"
            ))));
        }
    };

    tracing::info!(
        payment_id = payment.id,
        payment_type = %kind,
        amount = %payment.amount,
        created_by = user.user_id,
        "Payment recorded"
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(payment.into()))))
}

/// GET /api/v1/payments/{id}
pub async fn get_payment(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PaymentView>>> {
    let payment = PaymentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Payment",
            id,
        }))?;
    Ok(Json(DataResponse::new(payment.into())))
}

/// DELETE /api/v1/payments/{id}
///
/// Vendor and adjustment payments only.
pub async fn delete_payment(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    PaymentRepo::delete(&state.pool, id).await?;
    tracing::info!(payment_id = id, deleted_by = user.user_id, "Payment deleted");
    Ok(StatusCode::NO_CONTENT)
}
