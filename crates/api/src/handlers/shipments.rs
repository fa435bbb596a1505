//! Handlers for `/shipments`.
//!
//! Shipments exist only for paid online orders. Moving a shipment to
//! `in_transit` or `delivered` advances its order to `shipped` or
//! `delivered` in the same transaction.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use shopdesk_core::error::CoreError;
use shopdesk_core::search::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use shopdesk_core::shipping::ShipmentStatus;
use shopdesk_core::types::DbId;
use shopdesk_core::validation::{validate_optional_text, MAX_NOTE_LEN};
use shopdesk_db::models::shipment::{CreateShipment, Shipment, ShipmentFilter};
use shopdesk_db::repositories::ShipmentRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ShipmentListParams {
    pub status: Option<String>,
    pub order_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateShipmentStatus {
    pub status: String,
}

/// GET /api/v1/shipments
pub async fn list_shipments(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(params): Query<ShipmentListParams>,
) -> AppResult<Json<DataResponse<Vec<Shipment>>>> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<ShipmentStatus>)
        .transpose()?;
    let filter = ShipmentFilter {
        status: status.map(|s| s.as_str().to_string()),
        order_id: params.order_id,
    };
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(params.offset);

    let shipments = ShipmentRepo::list(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse::new(shipments)))
}

/// POST /api/v1/shipments
pub async fn create_shipment(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Json(input): Json<CreateShipment>,
) -> AppResult<(StatusCode, Json<DataResponse<Shipment>>)> {
    validate_optional_text(input.notes.as_deref(), "Notes", MAX_NOTE_LEN)?;

    let shipment = ShipmentRepo::create(&state.pool, &input, Some(user.user_id)).await?;
    tracing::info!(
        shipment_id = shipment.id,
        order_id = shipment.order_id,
        carrier = %shipment.carrier,
        created_by = user.user_id,
        "Shipment created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(shipment))))
}

/// GET /api/v1/shipments/{id}
pub async fn get_shipment(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Shipment>>> {
    let shipment = ShipmentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Shipment",
            id,
        }))?;
    Ok(Json(DataResponse::new(shipment)))
}

/// PUT /api/v1/shipments/{id}/status
pub async fn update_shipment_status(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateShipmentStatus>,
) -> AppResult<Json<DataResponse<Shipment>>> {
    let to = input.status.parse::<ShipmentStatus>()?;
    let shipment = ShipmentRepo::update_status(&state.pool, id, to).await?;
    tracing::info!(
        shipment_id = id,
        order_id = shipment.order_id,
        status = %to,
        updated_by = user.user_id,
        "Shipment status changed"
    );
    Ok(Json(DataResponse::new(shipment)))
}
