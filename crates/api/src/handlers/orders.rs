//! Handlers for `/orders` and `/pos/sales`.
//!
//! Orders are created by storefront checkout or at the point of sale.
//! Back-office staff move them through fulfilment and issue full refunds.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use shopdesk_core::error::CoreError;
use shopdesk_core::money::validate_amount;
use shopdesk_core::orders::{CartRequest, OrderChannel, OrderStatus};
use shopdesk_core::payments::PaymentMethod;
use shopdesk_core::search::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use shopdesk_core::types::DbId;
use shopdesk_core::validation::{validate_optional_text, MAX_NOTE_LEN};
use shopdesk_db::models::order::{NewSale, Order, OrderDetail, OrderFilter, RefundOrder};
use shopdesk_db::repositories::{CustomerRepo, OrderRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::query::timestamp_bounds;
use crate::response::DataResponse;
use crate::state::AppState;

/// One requested cart line in a checkout or POS sale body.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SaleLine {
    pub product_id: DbId,
    pub quantity: i32,
}

impl From<SaleLine> for CartRequest {
    fn from(line: SaleLine) -> Self {
        CartRequest {
            product_id: line.product_id,
            quantity: line.quantity,
        }
    }
}

/// Query parameters for `GET /orders`.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub status: Option<String>,
    pub channel: Option<String>,
    pub customer_id: Option<DbId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl OrderListParams {
    fn filter(&self) -> Result<OrderFilter, CoreError> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<OrderStatus>)
            .transpose()?;
        let channel = self
            .channel
            .as_deref()
            .map(str::parse::<OrderChannel>)
            .transpose()?;
        let (from, to) = timestamp_bounds(self.from, self.to)?;
        Ok(OrderFilter {
            status: status.map(|s| s.as_str().to_string()),
            channel: channel.map(|c| c.as_str().to_string()),
            customer_id: self.customer_id,
            from,
            to,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatus {
    pub status: String,
}

/// Body of `POST /pos/sales`.
#[derive(Debug, Deserialize)]
pub struct PosSaleRequest {
    pub customer_id: Option<DbId>,
    pub items: Vec<SaleLine>,
    #[serde(default)]
    pub points_to_redeem: i64,
    /// Manual discount applied before tax. Capped at the subtotal.
    #[serde(default)]
    pub discount: Decimal,
    pub method: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// GET /api/v1/orders
pub async fn list_orders(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(params): Query<OrderListParams>,
) -> AppResult<Json<DataResponse<Vec<Order>>>> {
    let filter = params.filter()?;
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(params.offset);

    let orders = OrderRepo::list(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse::new(orders)))
}

/// GET /api/v1/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OrderDetail>>> {
    let order = OrderRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Order", id }))?;
    Ok(Json(DataResponse::new(order)))
}

/// PUT /api/v1/orders/{id}/status
///
/// Refunds go through `POST /orders/{id}/refund`, not this endpoint.
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateOrderStatus>,
) -> AppResult<Json<DataResponse<Order>>> {
    let to = input.status.parse::<OrderStatus>()?;
    if to == OrderStatus::Refunded {
        return Err(AppError::Core(CoreError::Validation(
            "Use the refund endpoint to refund an order".into(),
        )));
    }

    let order = OrderRepo::update_status(&state.pool, id, to).await?;
    tracing::info!(order_id = id, status = %to, updated_by = user.user_id, "Order status changed");
    Ok(Json(DataResponse::new(order)))
}

/// POST /api/v1/orders/{id}/refund
///
/// Full refund: restocks every line, records a negative refund payment,
/// reverses loyalty points and voids any open invoice.
pub async fn refund_order(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<RefundOrder>,
) -> AppResult<Json<DataResponse<OrderDetail>>> {
    if let Some(method) = &input.method {
        method.parse::<PaymentMethod>()?;
    }
    validate_optional_text(input.notes.as_deref(), "Notes", MAX_NOTE_LEN)?;

    let order = OrderRepo::refund(&state.pool, id, &input, Some(user.user_id)).await?;
    tracing::info!(
        order_id = id,
        order_number = %order.order.order_number,
        total = %order.order.total,
        refunded_by = user.user_id,
        "Order refunded"
    );
    Ok(Json(DataResponse::new(order)))
}

/// POST /api/v1/pos/sales
///
/// Records an in-store sale. The order is completed immediately and no
/// shipping is charged.
pub async fn create_pos_sale(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Json(input): Json<PosSaleRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<OrderDetail>>)> {
    let method = input.method.parse::<PaymentMethod>()?;
    validate_amount(input.discount, "Discount")?;
    validate_points(input.points_to_redeem)?;
    validate_optional_text(input.reference.as_deref(), "Reference", MAX_NOTE_LEN)?;
    validate_optional_text(input.notes.as_deref(), "Notes", MAX_NOTE_LEN)?;
    if let Some(customer_id) = input.customer_id {
        if CustomerRepo::find_by_id(&state.pool, customer_id).await?.is_none() {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Customer {customer_id} does not exist"
            ))));
        }
    }

    let sale = NewSale {
        customer_id: input.customer_id,
        channel: OrderChannel::Pos.as_str().to_string(),
        status: OrderStatus::Completed.as_str().to_string(),
        lines: input.items.into_iter().map(CartRequest::from).collect(),
        points_to_redeem: input.points_to_redeem,
        manual_discount: input.discount,
        charge_shipping: false,
        shipping_address: None,
        notes: input.notes,
        method: method.as_str().to_string(),
        reference: input.reference,
        created_by: Some(user.user_id),
    };
    let order = OrderRepo::record_sale(&state.pool, &sale).await?;
    tracing::info!(
        order_id = order.order.id,
        order_number = %order.order.order_number,
        total = %order.order.total,
        created_by = user.user_id,
        "POS sale recorded"
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(order))))
}

/// Points to redeem must be non-negative.
pub fn validate_points(points: i64) -> Result<(), CoreError> {
    if points < 0 {
        return Err(CoreError::Validation(format!(
            "Points to redeem must be non-negative, got {points}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn filter_parses_status_and_channel() {
        let params = OrderListParams {
            status: Some("paid".into()),
            channel: Some("online".into()),
            customer_id: Some(7),
            ..OrderListParams::default()
        };
        let filter = params.filter().unwrap();
        assert_eq!(filter.status.as_deref(), Some("paid"));
        assert_eq!(filter.channel.as_deref(), Some("online"));
        assert_eq!(filter.customer_id, Some(7));
    }

    #[test]
    fn filter_rejects_unknown_channel() {
        let params = OrderListParams {
            channel: Some("phone".into()),
            ..OrderListParams::default()
        };
        assert_matches!(params.filter(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn negative_points_are_rejected() {
        assert!(validate_points(0).is_ok());
        assert_matches!(validate_points(-1), Err(CoreError::Validation(_)));
    }

    #[test]
    fn sale_line_converts_to_cart_request() {
        let cart = CartRequest::from(SaleLine {
            product_id: 3,
            quantity: 2,
        });
        assert_eq!(cart.product_id, 3);
        assert_eq!(cart.quantity, 2);
    }
}
