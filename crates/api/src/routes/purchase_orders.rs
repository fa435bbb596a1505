//! Route definitions for `/purchase-orders`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::purchase_orders as po;
use crate::state::AppState;

/// Routes mounted at `/purchase-orders`.
///
/// ```text
/// GET    /                 -> list_purchase_orders
/// POST   /                 -> create_purchase_order (draft)
/// GET    /{id}             -> get_purchase_order
/// PUT    /{id}             -> update_purchase_order (draft only)
/// DELETE /{id}             -> delete_purchase_order (draft only)
/// POST   /{id}/send        -> send_purchase_order
/// POST   /{id}/cancel      -> cancel_purchase_order
/// POST   /{id}/receive     -> receive_goods
/// GET    /{id}/payments    -> list_payments
/// POST   /{id}/payments    -> record_payment
/// GET    /{id}/receipts    -> list_receipts
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(po::list_purchase_orders).post(po::create_purchase_order),
        )
        .route(
            "/{id}",
            get(po::get_purchase_order)
                .put(po::update_purchase_order)
                .delete(po::delete_purchase_order),
        )
        .route("/{id}/send", post(po::send_purchase_order))
        .route("/{id}/cancel", post(po::cancel_purchase_order))
        .route("/{id}/receive", post(po::receive_goods))
        .route(
            "/{id}/payments",
            get(po::list_payments).post(po::record_payment),
        )
        .route("/{id}/receipts", get(po::list_receipts))
}
