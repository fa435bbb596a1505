use axum::routing::get;
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Routes mounted at `/payments`.
///
/// ```text
/// GET    /        -> list_payments
/// POST   /        -> create_payment (vendor or adjustment)
/// GET    /{id}    -> get_payment
/// DELETE /{id}    -> delete_payment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(payments::list_payments).post(payments::create_payment),
        )
        .route(
            "/{id}",
            get(payments::get_payment).delete(payments::delete_payment),
        )
}
