//! Handlers for `/expense-categories` and `/expenses`.
//!
//! Creating an expense also books a negative `expense` payment; editing or
//! deleting the expense keeps that payment in step.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use shopdesk_core::error::CoreError;
use shopdesk_core::expenses::{
    normalize_color, validate_category_name, validate_color, validate_expense, ExpenseKind,
};
use shopdesk_core::money::validate_positive_amount;
use shopdesk_core::payments::PaymentMethod;
use shopdesk_core::reports::validate_period;
use shopdesk_core::search::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use shopdesk_core::types::DbId;
use shopdesk_core::validation::{
    validate_optional_text, validate_required_text, MAX_NAME_LEN, MAX_NOTE_LEN,
};
use shopdesk_db::models::expense::{
    CreateExpense, CreateExpenseCategory, Expense, ExpenseCategory, ExpenseFilter,
    UpdateExpense, UpdateExpenseCategory,
};
use shopdesk_db::repositories::{ExpenseCategoryRepo, ExpenseRepo, VendorRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// GET /api/v1/expense-categories
pub async fn list_categories(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
) -> AppResult<Json<DataResponse<Vec<ExpenseCategory>>>> {
    let categories = ExpenseCategoryRepo::list(&state.pool).await?;
    Ok(Json(DataResponse::new(categories)))
}

/// POST /api/v1/expense-categories
pub async fn create_category(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Json(input): Json<CreateExpenseCategory>,
) -> AppResult<(StatusCode, Json<DataResponse<ExpenseCategory>>)> {
    let input = CreateExpenseCategory {
        name: input.name.trim().to_string(),
        kind: canonical_kind(input.kind.as_deref())?,
        color: canonical_color(input.color.as_deref())?,
    };
    validate_category_name(&input.name)?;

    let category = ExpenseCategoryRepo::create(&state.pool, &input).await?;
    tracing::info!(
        category_id = category.id,
        name = %category.name,
        created_by = user.user_id,
        "Expense category created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(category))))
}

/// GET /api/v1/expense-categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ExpenseCategory>>> {
    let category = ExpenseCategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ExpenseCategory",
            id,
        }))?;
    Ok(Json(DataResponse::new(category)))
}

/// PUT /api/v1/expense-categories/{id}
pub async fn update_category(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateExpenseCategory>,
) -> AppResult<Json<DataResponse<ExpenseCategory>>> {
    let input = UpdateExpenseCategory {
        name: input.name.map(|n| n.trim().to_string()),
        kind: canonical_kind(input.kind.as_deref())?,
        color: canonical_color(input.color.as_deref())?,
    };
    if let Some(name) = &input.name {
        validate_category_name(name)?;
    }

    let category = ExpenseCategoryRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ExpenseCategory",
            id,
        }))?;
    tracing::info!(category_id = id, updated_by = user.user_id, "Expense category updated");
    Ok(Json(DataResponse::new(category)))
}

/// DELETE /api/v1/expense-categories/{id}
///
/// Fails with 409 while any expense still uses the category.
pub async fn delete_category(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    ExpenseCategoryRepo::delete(&state.pool, id).await?;
    tracing::info!(category_id = id, deleted_by = user.user_id, "Expense category deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ExpenseListParams {
    pub category_id: Option<DbId>,
    pub vendor_id: Option<DbId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/expenses
pub async fn list_expenses(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(params): Query<ExpenseListParams>,
) -> AppResult<Json<DataResponse<Vec<Expense>>>> {
    if let (Some(from), Some(to)) = (params.from, params.to) {
        validate_period(from, to)?;
    }
    let filter = ExpenseFilter {
        category_id: params.category_id,
        vendor_id: params.vendor_id,
        from: params.from,
        to: params.to,
    };
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(params.offset);

    let expenses = ExpenseRepo::list(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse::new(expenses)))
}

/// POST /api/v1/expenses
pub async fn create_expense(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Json(input): Json<CreateExpense>,
) -> AppResult<(StatusCode, Json<DataResponse<Expense>>)> {
    let method = input.method.parse::<PaymentMethod>()?;
    let input = CreateExpense {
        description: input.description.trim().to_string(),
        method: method.as_str().to_string(),
        ..input
    };
    validate_expense(&input.description, input.amount, input.notes.as_deref())?;
    ensure_category_exists(&state, input.category_id).await?;
    if let Some(vendor_id) = input.vendor_id {
        ensure_vendor_exists(&state, vendor_id).await?;
    }

    let expense = ExpenseRepo::create(&state.pool, &input, Some(user.user_id)).await?;
    tracing::info!(
        expense_id = expense.id,
        amount = %expense.amount,
        category_id = expense.category_id,
        created_by = user.user_id,
        "Expense recorded"
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(expense))))
}

/// GET /api/v1/expenses/{id}
pub async fn get_expense(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Expense>>> {
    let expense = ExpenseRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Expense",
            id,
        }))?;
    Ok(Json(DataResponse::new(expense)))
}

/// PUT /api/v1/expenses/{id}
pub async fn update_expense(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateExpense>,
) -> AppResult<Json<DataResponse<Expense>>> {
    let method = input
        .method
        .as_deref()
        .map(str::parse::<PaymentMethod>)
        .transpose()?;
    let input = UpdateExpense {
        description: input.description.map(|d| d.trim().to_string()),
        method: method.map(|m| m.as_str().to_string()),
        ..input
    };
    if let Some(description) = &input.description {
        validate_required_text(description, "Description", MAX_NAME_LEN)?;
    }
    if let Some(amount) = input.amount {
        validate_positive_amount(amount, "Expense amount")?;
    }
    validate_optional_text(input.notes.as_deref(), "Notes", MAX_NOTE_LEN)?;
    if let Some(category_id) = input.category_id {
        ensure_category_exists(&state, category_id).await?;
    }
    if let Some(vendor_id) = input.vendor_id {
        ensure_vendor_exists(&state, vendor_id).await?;
    }

    let expense = ExpenseRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Expense",
            id,
        }))?;
    tracing::info!(expense_id = id, updated_by = user.user_id, "Expense updated");
    Ok(Json(DataResponse::new(expense)))
}

/// DELETE /api/v1/expenses/{id}
///
/// Removes the expense and its payment.
pub async fn delete_expense(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    ExpenseRepo::delete(&state.pool, id).await?;
    tracing::info!(expense_id = id, deleted_by = user.user_id, "Expense deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn canonical_kind(kind: Option<&str>) -> Result<Option<String>, CoreError> {
    kind.map(|k| k.trim().to_ascii_uppercase().parse::<ExpenseKind>())
        .transpose()
        .map(|k| k.map(|k| k.as_str().to_string()))
}

fn canonical_color(color: Option<&str>) -> Result<Option<String>, CoreError> {
    match color.map(str::trim) {
        Some(c) => {
            validate_color(c)?;
            Ok(Some(normalize_color(c)))
        }
        None => Ok(None),
    }
}

async fn ensure_category_exists(state: &AppState, category_id: DbId) -> AppResult<()> {
    if ExpenseCategoryRepo::find_by_id(&state.pool, category_id)
        .await?
        .is_none()
    {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Expense category {category_id} does not exist"
        ))));
    }
    Ok(())
}

async fn ensure_vendor_exists(state: &AppState, vendor_id: DbId) -> AppResult<()> {
    if VendorRepo::find_by_id(&state.pool, vendor_id).await?.is_none() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Vendor {vendor_id} does not exist"
        ))));
    }
    Ok(())
}
