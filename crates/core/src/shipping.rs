//! Outbound shipments for storefront orders.

use crate::error::CoreError;
use crate::validation::{validate_optional_text, validate_required_text};

/// Maximum length of carrier names and tracking numbers.
pub const MAX_TRACKING_LEN: usize = 100;

text_enum! {
    ShipmentStatus {
        Pending => "pending",
        InTransit => "in_transit",
        Delivered => "delivered",
        Returned => "returned",
    }
}

/// pending → in_transit | returned, in_transit → delivered | returned.
pub fn ensure_transition(from: ShipmentStatus, to: ShipmentStatus) -> Result<(), CoreError> {
    use ShipmentStatus::*;
    let allowed = matches!(
        (from, to),
        (Pending, InTransit) | (Pending, Returned) | (InTransit, Delivered) | (InTransit, Returned)
    );
    if !allowed {
        return Err(CoreError::Conflict(format!(
            "Cannot move shipment from {from} to {to}"
        )));
    }
    Ok(())
}

pub fn validate_tracking(carrier: &str, tracking_number: Option<&str>) -> Result<(), CoreError> {
    validate_required_text(carrier, "Carrier", MAX_TRACKING_LEN)?;
    validate_optional_text(tracking_number, "Tracking number", MAX_TRACKING_LEN)
}
