//! Route definitions for expenses and their categories.

use axum::routing::get;
use axum::Router;

use crate::handlers::expenses;
use crate::state::AppState;

/// Routes mounted at `/expense-categories`.
///
/// ```text
/// GET    /        -> list_categories
/// POST   /        -> create_category
/// GET    /{id}    -> get_category
/// PUT    /{id}    -> update_category
/// DELETE /{id}    -> delete_category (409 while in use)
/// ```
pub fn categories_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(expenses::list_categories).post(expenses::create_category),
        )
        .route(
            "/{id}",
            get(expenses::get_category)
                .put(expenses::update_category)
                .delete(expenses::delete_category),
        )
}

/// Routes mounted at `/expenses`.
///
/// ```text
/// GET    /        -> list_expenses
/// POST   /        -> create_expense
/// GET    /{id}    -> get_expense
/// PUT    /{id}    -> update_expense
/// DELETE /{id}    -> delete_expense
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(expenses::list_expenses).post(expenses::create_expense),
        )
        .route(
            "/{id}",
            get(expenses::get_expense)
                .put(expenses::update_expense)
                .delete(expenses::delete_expense),
        )
}
