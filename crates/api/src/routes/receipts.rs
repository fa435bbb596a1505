use axum::routing::get;
use axum::Router;

use crate::handlers::receipts;
use crate::state::AppState;

/// Routes mounted at `/receipts`.
///
/// ```text
/// GET    /        -> list_receipts (?purchase_order_id=)
/// GET    /{id}    -> get_receipt
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(receipts::list_receipts))
        .route("/{id}", get(receipts::get_receipt))
}
