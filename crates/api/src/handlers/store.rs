//! Storefront handlers mounted at `/store`.
//!
//! Catalog routes are public and only show active products, without cost
//! or reorder data. Checkout, order history and the loyalty balance need a
//! user account linked to a customer; a customer only ever sees their own
//! orders.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopdesk_core::error::CoreError;
use shopdesk_core::orders::{CartRequest, OrderChannel, OrderStatus};
use shopdesk_core::payments::PaymentMethod;
use shopdesk_core::types::DbId;
use shopdesk_core::validation::{validate_optional_text, validate_required_text, MAX_NOTE_LEN};
use shopdesk_db::models::loyalty::LoyaltySummary;
use shopdesk_db::models::order::{NewSale, Order, OrderDetail, OrderFilter};
use shopdesk_db::models::product::Product;
use shopdesk_db::models::shipment::{Shipment, ShipmentFilter};
use shopdesk_db::repositories::{LoyaltyRepo, OrderRepo, ProductRepo, ShipmentRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::orders::{validate_points, SaleLine};
use crate::handlers::products::ProductListParams;
use crate::middleware::rbac::RequireCustomer;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Longest accepted shipping address or payment reference.
const MAX_ADDRESS_LEN: usize = 500;

/// A product as shown to shoppers.
#[derive(Debug, Serialize)]
pub struct StoreProduct {
    pub id: DbId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub in_stock: bool,
    pub stock_quantity: i32,
}

impl From<Product> for StoreProduct {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            sku: p.sku,
            name: p.name,
            description: p.description,
            category: p.category,
            price: p.price,
            in_stock: p.stock_quantity > 0,
            stock_quantity: p.stock_quantity,
        }
    }
}

/// Body of `POST /store/checkout`.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<SaleLine>,
    #[serde(default)]
    pub points_to_redeem: i64,
    pub shipping_address: String,
    /// Reference returned by the card processor for this charge.
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
}

/// An order with its shipments, for tracking.
#[derive(Debug, Serialize)]
pub struct StoreOrderDetail {
    #[serde(flatten)]
    pub order: OrderDetail,
    pub shipments: Vec<Shipment>,
}

/// GET /api/v1/store/categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let categories = ProductRepo::list_categories(&state.pool).await?;
    Ok(Json(DataResponse::new(categories)))
}

/// GET /api/v1/store/products?search=&category=
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> AppResult<Json<DataResponse<Vec<StoreProduct>>>> {
    let (limit, offset) = params.resolve();
    let products = ProductRepo::list(&state.pool, &params.filter(true), limit, offset).await?;
    Ok(Json(DataResponse::new(
        products.into_iter().map(StoreProduct::from).collect(),
    )))
}

/// GET /api/v1/store/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<StoreProduct>>> {
    let product = ProductRepo::find_active(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }))?;
    Ok(Json(DataResponse::new(product.into())))
}

/// POST /api/v1/store/checkout
///
/// Places a paid online order charged to a card. Tax and the flat shipping
/// fee come from the store settings. Redeemed points reduce the taxable
/// amount and earned points are credited on the remainder.
pub async fn checkout(
    State(state): State<AppState>,
    RequireCustomer(user, customer_id): RequireCustomer,
    Json(input): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<OrderDetail>>)> {
    validate_points(input.points_to_redeem)?;
    validate_required_text(&input.shipping_address, "Shipping address", MAX_ADDRESS_LEN)?;
    validate_optional_text(
        input.payment_reference.as_deref(),
        "Payment reference",
        MAX_ADDRESS_LEN,
    )?;
    validate_optional_text(input.notes.as_deref(), "Notes", MAX_NOTE_LEN)?;

    let sale = NewSale {
        customer_id: Some(customer_id),
        channel: OrderChannel::Online.as_str().to_string(),
        status: OrderStatus::Paid.as_str().to_string(),
        lines: input.items.into_iter().map(CartRequest::from).collect(),
        points_to_redeem: input.points_to_redeem,
        manual_discount: Decimal::ZERO,
        charge_shipping: true,
        shipping_address: Some(input.shipping_address.trim().to_string()),
        notes: input.notes,
        method: PaymentMethod::Card.as_str().to_string(),
        reference: input.payment_reference,
        created_by: Some(user.user_id),
    };
    let order = OrderRepo::record_sale(&state.pool, &sale).await?;
    tracing::info!(
        order_id = order.order.id,
        order_number = %order.order.order_number,
        customer_id,
        total = %order.order.total,
        points_redeemed = order.order.points_redeemed,
        points_earned = order.order.points_earned,
        "Checkout completed"
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(order))))
}

/// GET /api/v1/store/orders
pub async fn list_my_orders(
    State(state): State<AppState>,
    RequireCustomer(_user, customer_id): RequireCustomer,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Order>>>> {
    let filter = OrderFilter {
        customer_id: Some(customer_id),
        ..OrderFilter::default()
    };
    let (limit, offset) = page.resolve();
    let orders = OrderRepo::list(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse::new(orders)))
}

/// GET /api/v1/store/orders/{id}
///
/// Another customer's order is reported as not found.
pub async fn get_my_order(
    State(state): State<AppState>,
    RequireCustomer(_user, customer_id): RequireCustomer,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<StoreOrderDetail>>> {
    let order = OrderRepo::find_detail(&state.pool, id)
        .await?
        .filter(|detail| detail.order.customer_id == Some(customer_id))
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Order", id }))?;

    let filter = ShipmentFilter {
        order_id: Some(id),
        ..ShipmentFilter::default()
    };
    let shipments = ShipmentRepo::list(&state.pool, &filter, 100, 0).await?;
    Ok(Json(DataResponse::new(StoreOrderDetail { order, shipments })))
}

/// GET /api/v1/store/loyalty
pub async fn my_loyalty(
    State(state): State<AppState>,
    RequireCustomer(_user, customer_id): RequireCustomer,
) -> AppResult<Json<DataResponse<LoyaltySummary>>> {
    let summary = LoyaltyRepo::summary(&state.pool, customer_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Customer",
            id: customer_id,
        }))?;
    Ok(Json(DataResponse::new(summary)))
}
