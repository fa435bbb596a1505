use axum::routing::get;
use axum::Router;

use crate::handlers::reports;
use crate::state::AppState;

/// Routes mounted at `/reports`.
///
/// ```text
/// GET    /summary                 -> financial_summary (?from=&to=)
/// GET    /expenses-by-category    -> expenses_by_category (?from=&to=)
/// GET    /sales-by-day            -> sales_by_day (?from=&to=)
/// GET    /purchase-orders         -> purchase_orders
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(reports::financial_summary))
        .route("/expenses-by-category", get(reports::expenses_by_category))
        .route("/sales-by-day", get(reports::sales_by_day))
        .route("/purchase-orders", get(reports::purchase_orders))
}
