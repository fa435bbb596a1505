//! Request handlers, one submodule per resource.
//!
//! Handlers extract the caller's role with the RBAC extractors, validate
//! input with `shopdesk_core`, delegate to the repositories in
//! `shopdesk_db` and map errors via [`AppError`](crate::error::AppError).

pub mod admin;
pub mod auth;
pub mod customers;
pub mod expenses;
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
