//! Handlers for the single-row store settings.

use axum::extract::State;
use axum::Json;
use shopdesk_core::error::CoreError;
use shopdesk_core::invoicing::validate_due_days;
use shopdesk_core::money::{validate_amount, validate_tax_rate};
use shopdesk_core::validation::{validate_required_text, MAX_NAME_LEN};
use shopdesk_db::models::settings::{StoreSettings, UpdateStoreSettings};
use shopdesk_db::repositories::SettingsRepo;

use crate::error::AppResult;
use crate::middleware::rbac::{RequireAdmin, RequireStaff};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/settings
pub async fn get_settings(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
) -> AppResult<Json<DataResponse<StoreSettings>>> {
    let settings = SettingsRepo::get(&state.pool).await?;
    Ok(Json(DataResponse::new(settings)))
}

/// PUT /api/v1/settings
///
/// Partial update; omitted fields keep their current value.
pub async fn update_settings(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(mut input): Json<UpdateStoreSettings>,
) -> AppResult<Json<DataResponse<StoreSettings>>> {
    validate_settings(&mut input)?;
    let settings = SettingsRepo::update(&state.pool, &input).await?;
    tracing::info!(updated_by = admin.user_id, "Store settings updated");
    Ok(Json(DataResponse::new(settings)))
}

fn validate_settings(input: &mut UpdateStoreSettings) -> Result<(), CoreError> {
    if let Some(name) = &input.store_name {
        validate_required_text(name, "Store name", MAX_NAME_LEN)?;
    }
    if let Some(currency) = &mut input.currency {
        *currency = currency.trim().to_ascii_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(CoreError::Validation(format!(
                "Currency must be a three-letter code, got '{currency}'"
            )));
        }
    }
    if let Some(rate) = input.default_tax_rate {
        validate_tax_rate(rate)?;
    }
    if let Some(fee) = input.flat_shipping_fee {
        validate_amount(fee, "Shipping fee")?;
    }
    if let Some(points) = input.loyalty_points_per_unit {
        if points < 0 {
            return Err(CoreError::Validation(format!(
                "Loyalty points per unit must be non-negative, got {points}"
            )));
        }
    }
    if let Some(value) = input.loyalty_point_value {
        validate_amount(value, "Loyalty point value")?;
    }
    if let Some(days) = input.invoice_due_days {
        validate_due_days(days)?;
    }
    Ok(())
}
