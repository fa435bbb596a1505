//! Handlers for `/receipts`: goods-received notes across all purchase orders.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use shopdesk_core::error::CoreError;
use shopdesk_core::search::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use shopdesk_core::types::DbId;
use shopdesk_db::models::receipt::{Receipt, ReceiptDetail};
use shopdesk_db::repositories::ReceiptRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReceiptListParams {
    pub purchase_order_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/receipts
pub async fn list_receipts(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(params): Query<ReceiptListParams>,
) -> AppResult<Json<DataResponse<Vec<Receipt>>>> {
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(params.offset);
    let receipts = ReceiptRepo::list(&state.pool, params.purchase_order_id, limit, offset).await?;
    Ok(Json(DataResponse::new(receipts)))
}

/// GET /api/v1/receipts/{id}
pub async fn get_receipt(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ReceiptDetail>>> {
    let receipt = ReceiptRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Receipt",
            id,
        }))?;
    Ok(Json(DataResponse::new(receipt)))
}
