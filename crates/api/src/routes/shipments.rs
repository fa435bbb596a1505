use axum::routing::{get, put};
use axum::Router;

use crate::handlers::shipments;
use crate::state::AppState;

/// Routes mounted at `/shipments`.
///
/// ```text
/// GET    /              -> list_shipments
/// POST   /              -> create_shipment
/// GET    /{id}          -> get_shipment
/// PUT    /{id}/status   -> update_shipment_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(shipments::list_shipments).post(shipments::create_shipment),
        )
        .route("/{id}", get(shipments::get_shipment))
        .route("/{id}/status", put(shipments::update_shipment_status))
}
