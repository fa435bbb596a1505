//! Handlers for `/products`: inventory CRUD, low-stock list, stock
//! adjustments and CSV export/import.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use shopdesk_core::csv::{self, ProductCsvRow, MAX_IMPORT_ROWS, PRODUCT_EXPORT_HEADERS};
use shopdesk_core::error::CoreError;
use shopdesk_core::inventory::{validate_product, validate_reorder_level, validate_sku};
use shopdesk_core::money::validate_amount;
use shopdesk_core::search::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use shopdesk_core::types::DbId;
use shopdesk_core::validation::{
    normalize_optional, validate_optional_text, validate_required_text, MAX_NAME_LEN,
    MAX_NOTE_LEN,
};
use shopdesk_db::models::product::{CreateProduct, Product, ProductFilter, UpdateProduct};
use shopdesk_db::repositories::ProductRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::response::{csv_attachment, DataResponse, ImportSummary};
use crate::state::AppState;

/// Query parameters for `GET /products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub search: Option<String>,
    pub category: Option<String>,
    /// Hide inactive products (default `false` in the back office).
    pub active_only: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ProductListParams {
    pub fn filter(&self, force_active: bool) -> ProductFilter {
        ProductFilter {
            search: normalize_optional(self.search.clone()),
            category: normalize_optional(self.category.clone()),
            active_only: force_active || self.active_only.unwrap_or(false),
        }
    }

    pub fn resolve(&self) -> (i64, i64) {
        (
            clamp_limit(self.limit, DEFAULT_LIMIT, MAX_LIMIT),
            clamp_offset(self.offset),
        )
    }
}

/// Request body for `POST /products/{id}/stock`.
#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    /// Signed change to the quantity on hand.
    pub delta: i32,
    pub reason: Option<String>,
}

/// GET /api/v1/products
pub async fn list_products(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(params): Query<ProductListParams>,
) -> AppResult<Json<DataResponse<Vec<Product>>>> {
    let (limit, offset) = params.resolve();
    let products = ProductRepo::list(&state.pool, &params.filter(false), limit, offset).await?;
    Ok(Json(DataResponse::new(products)))
}

/// GET /api/v1/products/low-stock
///
/// Active products at or below their reorder level, emptiest first.
pub async fn list_low_stock(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
) -> AppResult<Json<DataResponse<Vec<Product>>>> {
    let products = ProductRepo::list_low_stock(&state.pool).await?;
    Ok(Json(DataResponse::new(products)))
}

/// POST /api/v1/products
pub async fn create_product(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Json(input): Json<CreateProduct>,
) -> AppResult<(StatusCode, Json<DataResponse<Product>>)> {
    let input = CreateProduct {
        sku: input.sku.trim().to_string(),
        name: input.name.trim().to_string(),
        description: normalize_optional(input.description),
        category: normalize_optional(input.category),
        ..input
    };
    validate_sku(&input.sku)?;
    validate_product(
        &input.name,
        input.description.as_deref(),
        input.price,
        input.cost.unwrap_or(Decimal::ZERO),
    )?;
    validate_optional_text(input.category.as_deref(), "Category", MAX_NAME_LEN)?;
    if let Some(stock) = input.stock_quantity {
        if stock < 0 {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Opening stock must be non-negative, got {stock}"
            ))));
        }
    }
    if let Some(level) = input.reorder_level {
        validate_reorder_level(level)?;
    }

    let product = ProductRepo::create(&state.pool, &input).await?;
    tracing::info!(product_id = product.id, sku = %product.sku, created_by = user.user_id, "Product created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(product))))
}

/// GET /api/v1/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Product>>> {
    let product = ProductRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }))?;
    Ok(Json(DataResponse::new(product)))
}

/// PUT /api/v1/products/{id}
///
/// Stock is not editable here; use `POST /products/{id}/stock`.
pub async fn update_product(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProduct>,
) -> AppResult<Json<DataResponse<Product>>> {
    if let Some(sku) = &input.sku {
        validate_sku(sku)?;
    }
    if let Some(name) = &input.name {
        validate_required_text(name, "Product name", MAX_NAME_LEN)?;
    }
    validate_optional_text(input.description.as_deref(), "Description", MAX_NOTE_LEN)?;
    validate_optional_text(input.category.as_deref(), "Category", MAX_NAME_LEN)?;
    if let Some(price) = input.price {
        validate_amount(price, "Price")?;
    }
    if let Some(cost) = input.cost {
        validate_amount(cost, "Cost")?;
    }
    if let Some(level) = input.reorder_level {
        validate_reorder_level(level)?;
    }

    let product = ProductRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }))?;
    tracing::info!(product_id = id, updated_by = user.user_id, "Product updated");
    Ok(Json(DataResponse::new(product)))
}

/// DELETE /api/v1/products/{id}
///
/// Soft delete. Historical order and PO lines keep their product snapshot.
pub async fn delete_product(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !ProductRepo::soft_delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }));
    }
    tracing::info!(product_id = id, deleted_by = user.user_id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/products/{id}/stock
pub async fn adjust_stock(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<StockAdjustment>,
) -> AppResult<Json<DataResponse<Product>>> {
    validate_optional_text(input.reason.as_deref(), "Reason", MAX_NOTE_LEN)?;
    let product = ProductRepo::adjust_stock(&state.pool, id, input.delta).await?;
    tracing::info!(
        product_id = id,
        delta = input.delta,
        stock = product.stock_quantity,
        reason = input.reason.as_deref().unwrap_or(""),
        adjusted_by = user.user_id,
        "Stock adjusted"
    );
    Ok(Json(DataResponse::new(product)))
}

/// GET /api/v1/products/export
pub async fn export_products(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
) -> AppResult<impl IntoResponse> {
    let products = ProductRepo::list_all(&state.pool).await?;
    let rows: Vec<Vec<String>> = products
        .into_iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.sku,
                p.name,
                p.description.unwrap_or_default(),
                p.category.unwrap_or_default(),
                p.price.to_string(),
                p.cost.to_string(),
                p.stock_quantity.to_string(),
                p.reorder_level.to_string(),
                p.is_active.to_string(),
            ]
        })
        .collect();

    let body = csv::build(PRODUCT_EXPORT_HEADERS, &rows);
    Ok(csv_attachment("products.csv", body))
}

/// POST /api/v1/products/import
///
/// Upserts by SKU. Opening stock applies to new products only; existing
/// stock changes go through adjustments or receiving.
pub async fn import_products(
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

    let (rows, mut errors) = csv::convert_records(
        &records,
        ProductCsvRow::REQUIRED_COLUMNS,
        ProductCsvRow::from_record,
    )?;

    // A SKU repeated within one file would upsert twice; keep the first.
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::with_capacity(rows.len());
    for (line, row) in rows {
        if seen.insert(row.sku.clone()) {
            unique.push(row);
        } else {
            errors.push(csv::CsvLineError {
                line,
                message: format!("Duplicate SKU '{}' in file", row.sku),
            });
        }
    }
    errors.sort_by_key(|e| e.line);

    let outcomes = if unique.is_empty() {
        Vec::new()
    } else {
        ProductRepo::upsert_many(&state.pool, &unique).await?
    };
    let summary = ImportSummary::new(&outcomes, errors);

    tracing::info!(
        created = summary.created,
        updated = summary.updated,
        rejected = summary.errors.len(),
        imported_by = user.user_id,
        "Products imported"
    );
    Ok(Json(DataResponse::new(summary)))
}
