use axum::routing::{get, post};
use axum::Router;

use crate::handlers::invoices;
use crate::state::AppState;

/// Routes mounted at `/invoices`.
///
/// ```text
/// GET    /              -> list_invoices
/// POST   /              -> create_invoice (draft)
/// GET    /{id}          -> get_invoice
/// POST   /{id}/issue    -> issue_invoice
/// POST   /{id}/pay      -> pay_invoice
/// POST   /{id}/void     -> void_invoice
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route("/{id}", get(invoices::get_invoice))
        .route("/{id}/issue", post(invoices::issue_invoice))
        .route("/{id}/pay", post(invoices::pay_invoice))
        .route("/{id}/void", post(invoices::void_invoice))
}
