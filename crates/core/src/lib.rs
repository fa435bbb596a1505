//! Pure domain logic for the shopdesk commerce back office and storefront.
//!
//! Nothing in this crate touches the database or HTTP. Repositories and
//! handlers call into these modules to validate input and compute derived
//! values (line costs, totals, balances, loyalty points, report figures).

#[macro_use]
mod macros;

pub mod csv;
pub mod error;
pub mod expenses;
pub mod inventory;
pub mod invoicing;
pub mod loyalty;
pub mod money;
pub mod numbering;
pub mod orders;
pub mod payments;
pub mod purchasing;
pub mod reports;
pub mod roles;
pub mod search;
pub mod shipping;
pub mod types;
pub mod validation;
