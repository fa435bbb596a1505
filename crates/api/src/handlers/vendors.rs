//! Handlers for `/vendors` (suppliers).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use shopdesk_core::error::CoreError;
use shopdesk_core::types::DbId;
use shopdesk_core::validation::{
    normalize_optional, validate_email, validate_optional_text, validate_required_text,
    MAX_NAME_LEN, MAX_NOTE_LEN,
};
use shopdesk_db::models::vendor::{CreateVendor, UpdateVendor, Vendor};
use shopdesk_db::repositories::VendorRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::query::SearchParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/vendors
pub async fn list_vendors(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<DataResponse<Vec<Vendor>>>> {
    let (limit, offset) = params.resolve();
    let vendors = VendorRepo::list(&state.pool, params.term(), limit, offset).await?;
    Ok(Json(DataResponse::new(vendors)))
}

/// POST /api/v1/vendors
pub async fn create_vendor(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Json(input): Json<CreateVendor>,
) -> AppResult<(StatusCode, Json<DataResponse<Vendor>>)> {
    let input = CreateVendor {
        name: input.name.trim().to_string(),
        contact_name: normalize_optional(input.contact_name),
        email: normalize_optional(input.email),
        phone: normalize_optional(input.phone),
        address: normalize_optional(input.address),
        notes: normalize_optional(input.notes),
    };
    validate_required_text(&input.name, "Vendor name", MAX_NAME_LEN)?;
    validate_optional_text(input.contact_name.as_deref(), "Contact name", MAX_NAME_LEN)?;
    validate_email(input.email.as_deref())?;
    validate_optional_text(input.phone.as_deref(), "Phone", MAX_NAME_LEN)?;
    validate_optional_text(input.address.as_deref(), "Address", MAX_NOTE_LEN)?;
    validate_optional_text(input.notes.as_deref(), "Notes", MAX_NOTE_LEN)?;

    let vendor = VendorRepo::create(&state.pool, &input).await?;
    tracing::info!(vendor_id = vendor.id, created_by = user.user_id, "Vendor created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(vendor))))
}

/// GET /api/v1/vendors/{id}
pub async fn get_vendor(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vendor>>> {
    let vendor = VendorRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Vendor",
            id,
        }))?;
    Ok(Json(DataResponse::new(vendor)))
}

/// PUT /api/v1/vendors/{id}
pub async fn update_vendor(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateVendor>,
) -> AppResult<Json<DataResponse<Vendor>>> {
    if let Some(name) = &input.name {
        validate_required_text(name, "Vendor name", MAX_NAME_LEN)?;
    }
    validate_optional_text(input.contact_name.as_deref(), "Contact name", MAX_NAME_LEN)?;
    validate_email(input.email.as_deref())?;
    validate_optional_text(input.phone.as_deref(), "Phone", MAX_NAME_LEN)?;
    validate_optional_text(input.address.as_deref(), "Address", MAX_NOTE_LEN)?;
    validate_optional_text(input.notes.as_deref(), "Notes", MAX_NOTE_LEN)?;

    let vendor = VendorRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Vendor",
            id,
        }))?;
    tracing::info!(vendor_id = id, updated_by = user.user_id, "Vendor updated");
    Ok(Json(DataResponse::new(vendor)))
}

/// DELETE /api/v1/vendors/{id}
///
/// Soft delete; purchase orders and payments keep their vendor reference.
pub async fn delete_vendor(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !VendorRepo::soft_delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Vendor",
            id,
        }));
    }
    tracing::info!(vendor_id = id, deleted_by = user.user_id, "Vendor deleted");
    Ok(StatusCode::NO_CONTENT)
}
