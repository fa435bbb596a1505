//! Route definitions for `/customers`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::customers;
use crate::state::AppState;

/// Routes mounted at `/customers`.
///
/// ```text
/// GET    /                      -> list_customers
/// POST   /                      -> create_customer
/// GET    /export                -> export_customers (CSV)
/// POST   /import                -> import_customers (CSV body)
/// GET    /{id}                  -> get_customer
/// PUT    /{id}                  -> update_customer
/// DELETE /{id}                  -> delete_customer
/// GET    /{id}/loyalty          -> get_loyalty
/// POST   /{id}/loyalty/adjust   -> adjust_loyalty
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route("/export", get(customers::export_customers))
        .route("/import", post(customers::import_customers))
        .route(
            "/{id}",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        .route("/{id}/loyalty", get(customers::get_loyalty))
        .route("/{id}/loyalty/adjust", post(customers::adjust_loyalty))
}
