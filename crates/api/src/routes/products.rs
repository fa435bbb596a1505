//! Route definitions for `/products`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::products;
use crate::state::AppState;

/// Routes mounted at `/products`.
///
/// Static segments are registered before `/{id}`.
///
/// ```text
/// GET    /              -> list_products
/// POST   /              -> create_product
/// GET    /low-stock     -> list_low_stock
/// GET    /export        -> export_products (CSV)
/// POST   /import        -> import_products (CSV body)
/// GET    /{id}          -> get_product
/// PUT    /{id}          -> update_product
/// DELETE /{id}          -> delete_product
/// POST   /{id}/stock    -> adjust_stock
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(products::list_products).post(products::create_product),
        )
        .route("/low-stock", get(products::list_low_stock))
        .route("/export", get(products::export_products))
        .route("/import", post(products::import_products))
        .route(
            "/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/{id}/stock", post(products::adjust_stock))
}
