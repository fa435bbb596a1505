//! Handlers for `/customers`: CRUD, CSV export/import and loyalty.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use shopdesk_core::csv::{self, CustomerCsvRow, CUSTOMER_EXPORT_HEADERS, MAX_IMPORT_ROWS};
use shopdesk_core::error::CoreError;
use shopdesk_core::types::DbId;
use shopdesk_core::validation::{
    normalize_optional, validate_email, validate_optional_text, validate_required_text,
    MAX_NAME_LEN, MAX_NOTE_LEN,
};
use shopdesk_db::models::customer::{CreateCustomer, Customer, UpdateCustomer};
use shopdesk_db::models::loyalty::{AdjustLoyalty, LoyaltySummary, LoyaltyTransaction};
use shopdesk_db::repositories::{CustomerRepo, LoyaltyRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::query::SearchParams;
use crate::response::{csv_attachment, DataResponse, ImportSummary};
use crate::state::AppState;

const MAX_PHONE_LEN: usize = 50;

/// GET /api/v1/customers
pub async fn list_customers(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<DataResponse<Vec<Customer>>>> {
    let (limit, offset) = params.resolve();
    let customers = CustomerRepo::list(&state.pool, params.term(), limit, offset).await?;
    Ok(Json(DataResponse::new(customers)))
}

/// POST /api/v1/customers
pub async fn create_customer(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Json(input): Json<CreateCustomer>,
) -> AppResult<(StatusCode, Json<DataResponse<Customer>>)> {
    let input = CreateCustomer {
        name: input.name.trim().to_string(),
        email: normalize_optional(input.email).map(|e| e.to_ascii_lowercase()),
        phone: normalize_optional(input.phone),
        address: normalize_optional(input.address),
        notes: normalize_optional(input.notes),
    };
    validate_required_text(&input.name, "Name", MAX_NAME_LEN)?;
    validate_contact(
        input.email.as_deref(),
        input.phone.as_deref(),
        input.address.as_deref(),
        input.notes.as_deref(),
    )?;

    let customer = CustomerRepo::create(&state.pool, &input).await?;
    tracing::info!(customer_id = customer.id, created_by = user.user_id, "Customer created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(customer))))
}

/// GET /api/v1/customers/{id}
pub async fn get_customer(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Customer>>> {
    let customer = CustomerRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Customer",
            id,
        }))?;
    Ok(Json(DataResponse::new(customer)))
}

/// PUT /api/v1/customers/{id}
pub async fn update_customer(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateCustomer>,
) -> AppResult<Json<DataResponse<Customer>>> {
    if let Some(name) = &input.name {
        validate_required_text(name, "Name", MAX_NAME_LEN)?;
    }
    input.email = input.email.map(|e| e.trim().to_ascii_lowercase());
    validate_contact(
        input.email.as_deref(),
        input.phone.as_deref(),
        input.address.as_deref(),
        input.notes.as_deref(),
    )?;

    let customer = CustomerRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Customer",
            id,
        }))?;
    tracing::info!(customer_id = id, updated_by = user.user_id, "Customer updated");
    Ok(Json(DataResponse::new(customer)))
}

/// DELETE /api/v1/customers/{id}
///
/// Soft delete; orders keep pointing at the customer.
pub async fn delete_customer(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !CustomerRepo::soft_delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Customer",
            id,
        }));
    }
    tracing::info!(customer_id = id, deleted_by = user.user_id, "Customer deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/customers/export
pub async fn export_customers(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
) -> AppResult<impl IntoResponse> {
    let customers = CustomerRepo::list_all(&state.pool).await?;
    let rows: Vec<Vec<String>> = customers
        .into_iter()
        .map(|c| {
            vec![
                c.id.to_string(),
                c.name,
                c.email.unwrap_or_default(),
                c.phone.unwrap_or_default(),
                c.address.unwrap_or_default(),
                c.loyalty_points.to_string(),
                c.notes.unwrap_or_default(),
            ]
        })
        .collect();

    let body = csv::build(CUSTOMER_EXPORT_HEADERS, &rows);
    Ok(csv_attachment("customers.csv", body))
}

/// POST /api/v1/customers/import
///
/// Body is a CSV document with a header row. Valid rows are upserted by
/// email; invalid rows are reported by line number and skipped.
pub async fn import_customers(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    body: String,
) -> AppResult<Json<DataResponse<ImportSummary>>> {
    let records = csv::parse_records(&body)?;
    if records.len() > MAX_IMPORT_ROWS {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Import may contain at most {MAX_IMPORT_ROWS} rows, got {}",
            records.len()
        ))));
    }

    let (rows, errors) = csv::convert_records(
        &records,
        CustomerCsvRow::REQUIRED_COLUMNS,
        CustomerCsvRow::from_record,
    )?;
    let rows: Vec<CustomerCsvRow> = rows.into_iter().map(|(_, row)| row).collect();

    let outcomes = if rows.is_empty() {
        Vec::new()
    } else {
        CustomerRepo::upsert_many(&state.pool, &rows).await?
    };
    let summary = ImportSummary::new(&outcomes, errors);

    tracing::info!(
        created = summary.created,
        updated = summary.updated,
        rejected = summary.errors.len(),
        imported_by = user.user_id,
        "Customers imported"
    );
    Ok(Json(DataResponse::new(summary)))
}

/// GET /api/v1/customers/{id}/loyalty
pub async fn get_loyalty(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<LoyaltySummary>>> {
    let summary = LoyaltyRepo::summary(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Customer",
            id,
        }))?;
    Ok(Json(DataResponse::new(summary)))
}

/// POST /api/v1/customers/{id}/loyalty/adjust
pub async fn adjust_loyalty(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<AdjustLoyalty>,
) -> AppResult<(StatusCode, Json<DataResponse<LoyaltyTransaction>>)> {
    validate_optional_text(input.note.as_deref(), "Note", MAX_NOTE_LEN)?;
    let entry = LoyaltyRepo::adjust(&state.pool, id, &input, Some(user.user_id)).await?;
    tracing::info!(
        customer_id = id,
        points = input.points,
        adjusted_by = user.user_id,
        "Loyalty points adjusted"
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(entry))))
}

fn validate_contact(
    email: Option<&str>,
    phone: Option<&str>,
    address: Option<&str>,
    notes: Option<&str>,
) -> Result<(), CoreError> {
    validate_email(email)?;
    validate_optional_text(phone, "Phone", MAX_PHONE_LEN)?;
    validate_optional_text(address, "Address", MAX_NOTE_LEN)?;
    validate_optional_text(notes, "Notes", MAX_NOTE_LEN)
}
