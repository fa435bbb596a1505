//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches, where the
//!   entity can be edited

pub mod customer;
pub mod expense;
pub mod invoice;
pub mod loyalty;
pub mod order;
pub mod payment;
pub mod product;
pub mod purchase_order;
pub mod receipt;
pub mod report;
pub mod role;
pub mod session;
pub mod settings;
pub mod shipment;
pub mod user;
pub mod vendor;
