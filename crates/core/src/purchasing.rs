//! Purchase-order lifecycle and derived financial aggregates.
//!
//! A purchase order (PO) moves through:
//!
//! ```text
//! draft ──send──> sent ──receive──> partial ──receive──> received
//!   │               │
//!   └────cancel─────┴──> cancelled   (only while nothing has been received)
//! ```
//!
//! Each line stores its own cost breakdown:
//!
//! ```text
//! cost_excl_tax = quantity * unit_cost
//! total_tax     = round(cost_excl_tax * tax_rate / 100)
//! cost_incl_tax = cost_excl_tax + total_tax
//! total_price   = cost_incl_tax + shipping
//! ```
//!
//! The PO totals are sums over the lines. Balance and payment status compare
//! the PO total with the amount paid to the vendor so far.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::CoreError;
use crate::money::{round_money, validate_amount, validate_document_total, validate_tax_rate};
use crate::validation::validate_count_range;

/// Maximum number of lines on a single purchase order.
pub const MAX_PO_LINES: usize = 200;

/// Maximum quantity ordered on a single line.
pub const MAX_LINE_QUANTITY: i32 = 1_000_000;

text_enum! {
    /// Lifecycle status of a purchase order.
    PurchaseOrderStatus {
        Draft => "draft",
        Sent => "sent",
        Partial => "partial",
        Received => "received",
        Cancelled => "cancelled",
    }
}

text_enum! {
    /// How much of the PO total has been paid to the vendor.
    PaymentStatus {
        Unpaid => "unpaid",
        Partial => "partial",
        Paid => "paid",
        Overpaid => "overpaid",
    }
}

text_enum! {
    /// How much of the ordered quantity has arrived.
    ShippingStatus {
        NotReceived => "not_received",
        Partial => "partial",
        Received => "received",
    }
}

// ---------------------------------------------------------------------------
// Line arithmetic
// ---------------------------------------------------------------------------

/// Computed cost breakdown for one PO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineCost {
    pub cost_excl_tax: Decimal,
    pub total_tax: Decimal,
    pub cost_incl_tax: Decimal,
    pub total_price: Decimal,
}

impl LineCost {
    /// Shipping charged on this line.
    pub fn shipping(&self) -> Decimal {
        self.total_price - self.cost_incl_tax
    }
}

/// Compute the cost breakdown of a single line.
pub fn compute_line(
    quantity: i32,
    unit_cost: Decimal,
    tax_rate: Decimal,
    shipping: Decimal,
) -> LineCost {
    let cost_excl_tax = round_money(Decimal::from(quantity) * unit_cost);
    let total_tax = round_money(cost_excl_tax * tax_rate / Decimal::ONE_HUNDRED);
    let cost_incl_tax = cost_excl_tax + total_tax;
    let total_price = cost_incl_tax + round_money(shipping);
    LineCost {
        cost_excl_tax,
        total_tax,
        cost_incl_tax,
        total_price,
    }
}

/// Validate the user-entered values of one line, including the size of its
/// computed total.
pub fn validate_line(
    quantity: i32,
    unit_cost: Decimal,
    tax_rate: Decimal,
    shipping: Decimal,
) -> Result<(), CoreError> {
    if quantity <= 0 || quantity > MAX_LINE_QUANTITY {
        return Err(CoreError::Validation(format!(
            "Quantity must be between 1 and {MAX_LINE_QUANTITY}, got {quantity}"
        )));
    }
    validate_amount(unit_cost, "Unit cost")?;
    validate_tax_rate(tax_rate)?;
    validate_amount(shipping, "Shipping")?;
    let cost = compute_line(quantity, unit_cost, tax_rate, shipping);
    validate_document_total(cost.total_price, "Line total")
}

/// Validate the number of lines on a draft. Drafts may be saved without
/// lines; [`ensure_can_send`] requires at least one.
pub fn validate_line_count(count: usize) -> Result<(), CoreError> {
    if count > MAX_PO_LINES {
        return Err(CoreError::Validation(format!(
            "Purchase order may contain at most {MAX_PO_LINES} items, got {count}"
        )));
    }
    Ok(())
}

/// Validate the number of lines on one receipt.
pub fn validate_receipt_line_count(count: usize) -> Result<(), CoreError> {
    validate_count_range(count, MAX_PO_LINES, "Receipt")
}

// ---------------------------------------------------------------------------
// PO totals, balance, payment status
// ---------------------------------------------------------------------------

/// Aggregated totals over all lines of a PO.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurchaseOrderTotals {
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub shipping_total: Decimal,
    pub total: Decimal,
}

/// Sum line breakdowns into PO totals.
pub fn compute_totals(lines: &[LineCost]) -> PurchaseOrderTotals {
    lines
        .iter()
        .fold(PurchaseOrderTotals::default(), |acc, line| PurchaseOrderTotals {
            subtotal: acc.subtotal + line.cost_excl_tax,
            tax_total: acc.tax_total + line.total_tax,
            shipping_total: acc.shipping_total + line.shipping(),
            total: acc.total + line.total_price,
        })
}

/// Reject a PO whose summed total would not fit the stored totals.
pub fn validate_totals(totals: &PurchaseOrderTotals) -> Result<(), CoreError> {
    validate_document_total(totals.total, "Purchase order total")
}

/// Outstanding amount owed to the vendor. Negative when overpaid.
pub fn balance(total: Decimal, amount_paid: Decimal) -> Decimal {
    total - amount_paid
}

/// Derive the payment status of a PO from its total and the amount paid.
pub fn payment_status(total: Decimal, amount_paid: Decimal) -> PaymentStatus {
    if amount_paid > total {
        PaymentStatus::Overpaid
    } else if amount_paid == total {
        PaymentStatus::Paid
    } else if amount_paid <= Decimal::ZERO {
        PaymentStatus::Unpaid
    } else {
        PaymentStatus::Partial
    }
}

// ---------------------------------------------------------------------------
// Receiving
// ---------------------------------------------------------------------------

/// Ordered and received quantities of one PO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivingLine {
    pub ordered: i32,
    pub received: i32,
}

impl ReceivingLine {
    /// Quantity still expected from the vendor.
    pub fn outstanding(&self) -> i32 {
        (self.ordered - self.received).max(0)
    }
}

/// Derive the shipping status from per-line quantities.
pub fn shipping_status(lines: &[ReceivingLine]) -> ShippingStatus {
    let any_received = lines.iter().any(|l| l.received > 0);
    if !any_received {
        return ShippingStatus::NotReceived;
    }
    if lines.iter().all(|l| l.received >= l.ordered) {
        ShippingStatus::Received
    } else {
        ShippingStatus::Partial
    }
}

/// Status a sent PO moves to once the given quantities are on hand.
pub fn status_after_receiving(lines: &[ReceivingLine]) -> PurchaseOrderStatus {
    match shipping_status(lines) {
        ShippingStatus::NotReceived => PurchaseOrderStatus::Sent,
        ShippingStatus::Partial => PurchaseOrderStatus::Partial,
        ShippingStatus::Received => PurchaseOrderStatus::Received,
    }
}

/// Validate receiving `quantity` units against a line.
pub fn validate_receipt_line(line: ReceivingLine, quantity: i32) -> Result<(), CoreError> {
    if quantity <= 0 {
        return Err(CoreError::Validation(format!(
            "Received quantity must be greater than zero, got {quantity}"
        )));
    }
    let outstanding = line.outstanding();
    if quantity > outstanding {
        return Err(CoreError::Validation(format!(
            "Cannot receive {quantity} units; only {outstanding} outstanding"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Status guards
// ---------------------------------------------------------------------------

/// Lines, vendor and notes may only change while the PO is a draft.
pub fn ensure_editable(status: PurchaseOrderStatus) -> Result<(), CoreError> {
    if status != PurchaseOrderStatus::Draft {
        return Err(CoreError::Conflict(format!(
            "Purchase order is {status}; only draft orders can be modified"
        )));
    }
    Ok(())
}

/// A PO can be sent to the vendor when it is a draft with at least one line.
pub fn ensure_can_send(status: PurchaseOrderStatus, line_count: usize) -> Result<(), CoreError> {
    if status != PurchaseOrderStatus::Draft {
        return Err(CoreError::Conflict(format!(
            "Purchase order is {status}; only draft orders can be sent"
        )));
    }
    if line_count == 0 {
        return Err(CoreError::Validation(
            "Purchase order has no line items".into(),
        ));
    }
    Ok(())
}

/// Goods can be received against sent or partially received POs.
pub fn ensure_can_receive(status: PurchaseOrderStatus) -> Result<(), CoreError> {
    match status {
        PurchaseOrderStatus::Sent | PurchaseOrderStatus::Partial => Ok(()),
        other => Err(CoreError::Conflict(format!(
            "Cannot receive goods on a {other} purchase order"
        ))),
    }
}

/// A PO can be cancelled while it is a draft, or sent with nothing received.
pub fn ensure_can_cancel(
    status: PurchaseOrderStatus,
    lines: &[ReceivingLine],
) -> Result<(), CoreError> {
    match status {
        PurchaseOrderStatus::Draft => Ok(()),
        PurchaseOrderStatus::Sent if shipping_status(lines) == ShippingStatus::NotReceived => {
            Ok(())
        }
        other => Err(CoreError::Conflict(format!(
            "Cannot cancel a {other} purchase order with received goods"
        ))),
    }
}

/// Only draft POs may be deleted outright; later states must be cancelled.
pub fn ensure_deletable(status: PurchaseOrderStatus) -> Result<(), CoreError> {
    if status != PurchaseOrderStatus::Draft {
        return Err(CoreError::Conflict(format!(
            "Purchase order is {status}; cancel it instead of deleting"
        )));
    }
    Ok(())
}

/// Validate a vendor payment against the PO status and outstanding balance.
pub fn ensure_can_pay(
    status: PurchaseOrderStatus,
    amount: Decimal,
    outstanding: Decimal,
) -> Result<(), CoreError> {
    match status {
        PurchaseOrderStatus::Draft | PurchaseOrderStatus::Cancelled => {
            return Err(CoreError::Conflict(format!(
                "Cannot record a payment on a {status} purchase order"
            )));
        }
        _ => {}
    }
    if amount <= Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "Payment amount must be greater than zero, got {amount}"
        )));
    }
    if amount > outstanding {
        return Err(CoreError::Validation(format!(
            "Payment of {amount} exceeds outstanding balance of {outstanding}"
        )));
    }
    Ok(())
}
