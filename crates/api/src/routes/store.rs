//! Route definitions for the storefront.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::store;
use crate::state::AppState;

/// Routes mounted at `/store`.
///
/// ```text
/// GET    /categories       -> list_categories (public)
/// GET    /products         -> list_products (public)
/// GET    /products/{id}    -> get_product (public)
/// POST   /checkout         -> checkout (customer)
/// GET    /orders           -> list_my_orders (customer)
/// GET    /orders/{id}      -> get_my_order (customer)
/// GET    /loyalty          -> my_loyalty (customer)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(store::list_categories))
        .route("/products", get(store::list_products))
        .route("/products/{id}", get(store::get_product))
        .route("/checkout", post(store::checkout))
        .route("/orders", get(store::list_my_orders))
        .route("/orders/{id}", get(store::get_my_order))
        .route("/loyalty", get(store::my_loyalty))
}
