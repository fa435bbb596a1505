pub mod admin;
pub mod auth;
pub mod customers;
pub mod expenses;
pub mod health;
pub mod invoices;
pub mod orders;
pub mod payments;
pub mod products;
pub mod purchase_orders;
pub mod receipts;
pub mod reports;
pub mod settings;
pub mod shipments;
pub mod store;
pub mod vendors;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /health                                          service + database health
///
/// /auth/login                                      login (public)
/// /auth/refresh                                    refresh (public)
/// /auth/register                                   customer sign-up (public)
/// /auth/logout                                     logout (requires auth)
/// /auth/me                                         current user
///
/// /admin/users                                     list, create (admin only)
/// /admin/users/{id}                                deactivate
///
/// /settings                                        get (staff), update (admin)
///
/// /customers                                       list, create
/// /customers/export                                CSV export
/// /customers/import                                CSV import
/// /customers/{id}                                  get, update, delete
/// /customers/{id}/loyalty                          balance + history
/// /customers/{id}/loyalty/adjust                   manual adjustment
///
/// /vendors                                         list, create
/// /vendors/{id}                                    get, update, delete
///
/// /products                                        list, create
/// /products/low-stock                              reorder list
/// /products/export                                 CSV export
/// /products/import                                 CSV import
/// /products/{id}                                   get, update, delete
/// /products/{id}/stock                             stock adjustment
///
/// /purchase-orders                                 list, create
/// /purchase-orders/{id}                            get, update, delete
/// /purchase-orders/{id}/send                       draft -> sent
/// /purchase-orders/{id}/cancel                     cancel
/// /purchase-orders/{id}/receive                    receive goods
/// /purchase-orders/{id}/payments                   list, pay vendor
/// /purchase-orders/{id}/receipts                   receipts of one PO
///
/// /receipts                                        list
/// /receipts/{id}                                   get
///
/// /payments                                        list, create
/// /payments/{id}                                   get, delete
///
/// /expense-categories                              list, create
/// /expense-categories/{id}                         get, update, delete
/// /expenses                                        list, create
/// /expenses/{id}                                   get, update, delete
///
/// /orders                                          list
/// /orders/{id}                                     get
/// /orders/{id}/status                              fulfilment status
/// /orders/{id}/refund                              full refund
/// /pos/sales                                       point-of-sale sale
///
/// /invoices                                        list, create
/// /invoices/{id}                                   get
/// /invoices/{id}/issue | /pay | /void              lifecycle
///
/// /shipments                                       list, create
/// /shipments/{id}                                  get
/// /shipments/{id}/status                           status update
///
/// /reports/summary                                 financial summary
/// /reports/expenses-by-category                    expense breakdown
/// /reports/sales-by-day                            daily sales
/// /reports/purchase-orders                         PO totals + overdue
///
/// /store/categories                                public catalog
/// /store/products                                  public catalog
/// /store/products/{id}                             public catalog
/// /store/checkout                                  customer checkout
/// /store/orders                                    customer order history
/// /store/orders/{id}                               order + shipments
/// /store/loyalty                                   customer points
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        // Authentication routes (login, refresh, register, logout).
        .nest("/auth", auth::router())
        // Admin user management.
        .nest("/admin", admin::router())
        .nest("/settings", settings::router())
        // Back office.
        .nest("/customers", customers::router())
        .nest("/vendors", vendors::router())
        .nest("/products", products::router())
        .nest("/purchase-orders", purchase_orders::router())
        .nest("/receipts", receipts::router())
        .nest("/payments", payments::router())
        .nest("/expense-categories", expenses::categories_router())
        .nest("/expenses", expenses::router())
        .nest("/orders", orders::router())
        .nest("/pos", orders::pos_router())
        .nest("/invoices", invoices::router())
        .nest("/shipments", shipments::router())
        .nest("/reports", reports::router())
        // Storefront (public catalog, customer orders).
        .nest("/store", store::router())
}
