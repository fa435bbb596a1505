//! Route definitions for sales orders and point-of-sale sales.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::orders;
use crate::state::AppState;

/// Routes mounted at `/orders`.
///
/// ```text
/// GET    /              -> list_orders
/// GET    /{id}          -> get_order
/// PUT    /{id}/status   -> update_order_status
/// POST   /{id}/refund   -> refund_order
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list_orders))
        .route("/{id}", get(orders::get_order))
        .route("/{id}/status", put(orders::update_order_status))
        .route("/{id}/refund", post(orders::refund_order))
}

/// Routes mounted at `/pos`.
///
/// ```text
/// POST   /sales         -> create_pos_sale
/// ```
pub fn pos_router() -> Router<AppState> {
    Router::new().route("/sales", post(orders::create_pos_sale))
}
