//! Sales orders placed through the storefront or at the point of sale.
//!
//! ```text
//! paid ──> shipped ──> delivered ──> completed
//!   └─────────────────────────────────┘        (pickup / POS)
//! any state except refunded ──refund──> refunded
//! ```

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::CoreError;
use crate::money::{percent_of, round_money};
use crate::types::DbId;
use crate::validation::validate_count_range;

/// Maximum number of distinct products in one cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single product in one cart.
pub const MAX_CART_QUANTITY: i32 = 999;

text_enum! {
    /// Fulfilment status of a sales order.
    OrderStatus {
        Paid => "paid",
        Shipped => "shipped",
        Delivered => "delivered",
        Completed => "completed",
        Refunded => "refunded",
    }
}

text_enum! {
    /// Where the order was placed.
    OrderChannel {
        Online => "online",
        Pos => "pos",
    }
}

/// A requested cart line before prices are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartRequest {
    pub product_id: DbId,
    pub quantity: i32,
}

/// A cart line with its resolved unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: DbId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl PricedLine {
    pub fn line_total(&self) -> Decimal {
        round_money(Decimal::from(self.quantity) * self.unit_price)
    }
}

/// Money breakdown of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Amount tax is charged on.
    pub fn taxable(&self) -> Decimal {
        self.subtotal - self.discount
    }
}

/// Compute order totals. The discount is capped at the subtotal and tax is
/// charged on the discounted amount; shipping is untaxed.
pub fn compute_order_totals(
    lines: &[PricedLine],
    discount: Decimal,
    tax_rate: Decimal,
    shipping_fee: Decimal,
) -> OrderTotals {
    let subtotal: Decimal = lines.iter().map(PricedLine::line_total).sum();
    let discount = round_money(discount.max(Decimal::ZERO).min(subtotal));
    let tax = percent_of(subtotal - discount, tax_rate);
    let shipping_fee = round_money(shipping_fee);
    OrderTotals {
        subtotal,
        discount,
        tax,
        shipping_fee,
        total: subtotal - discount + tax + shipping_fee,
    }
}

/// Validate a requested cart: non-empty, bounded, positive quantities, no duplicates.
pub fn validate_cart(lines: &[CartRequest]) -> Result<(), CoreError> {
    validate_count_range(lines.len(), MAX_CART_LINES, "Cart")?;
    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        if line.quantity <= 0 || line.quantity > MAX_CART_QUANTITY {
            return Err(CoreError::Validation(format!(
                "Quantity for product {} must be between 1 and {MAX_CART_QUANTITY}, got {}",
                line.product_id, line.quantity
            )));
        }
        if !seen.insert(line.product_id) {
            return Err(CoreError::Validation(format!(
                "Product {} appears more than once in the cart",
                line.product_id
            )));
        }
    }
    Ok(())
}

/// Validate a manual status change. Refunds go through [`ensure_refundable`].
pub fn ensure_transition(from: OrderStatus, to: OrderStatus) -> Result<(), CoreError> {
    use OrderStatus::*;
    let allowed = matches!(
        (from, to),
        (Paid, Shipped) | (Paid, Completed) | (Shipped, Delivered) | (Delivered, Completed)
    );
    if !allowed {
        return Err(CoreError::Conflict(format!(
            "Cannot move order from {from} to {to}"
        )));
    }
    Ok(())
}

pub fn ensure_refundable(status: OrderStatus) -> Result<(), CoreError> {
    if status == OrderStatus::Refunded {
        return Err(CoreError::Conflict("Order has already been refunded".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use assert_matches::assert_matches;

    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(product_id: DbId, quantity: i32, price: &str) -> PricedLine {
        PricedLine {
            product_id,
            quantity,
            unit_price: d(price),
        }
    }

    #[test]
    fn totals_without_discount() {
        let totals = compute_order_totals(
            &[line(1, 2, "10.00"), line(2, 1, "5.50")],
            Decimal::ZERO,
            d("10"),
            d("4.99"),
        );
        assert_eq!(totals.subtotal, d("25.50"));
        assert_eq!(totals.discount, d("0"));
        assert_eq!(totals.tax, d("2.55"));
        assert_eq!(totals.shipping_fee, d("4.99"));
        assert_eq!(totals.total, d("33.04"));
    }

    #[test]
    fn discount_reduces_taxable_amount() {
        let totals = compute_order_totals(&[line(1, 1, "20.00")], d("5.00"), d("10"), d("0"));
        assert_eq!(totals.taxable(), d("15.00"));
        assert_eq!(totals.tax, d("1.50"));
        assert_eq!(totals.total, d("16.50"));
    }

    #[test]
    fn discount_is_capped_at_subtotal() {
        let totals = compute_order_totals(&[line(1, 1, "8.00")], d("50"), d("10"), d("3"));
        assert_eq!(totals.discount, d("8.00"));
        assert_eq!(totals.tax, d("0"));
        assert_eq!(totals.total, d("3"));
    }

    #[test]
    fn cart_validation() {
        let ok = [
            CartRequest { product_id: 1, quantity: 2 },
            CartRequest { product_id: 2, quantity: 1 },
        ];
        assert!(validate_cart(&ok).is_ok());
        assert!(validate_cart(&[]).is_err());
        assert!(validate_cart(&[CartRequest { product_id: 1, quantity: 0 }]).is_err());
        assert_matches!(
            validate_cart(&[
                CartRequest { product_id: 1, quantity: 1 },
                CartRequest { product_id: 1, quantity: 3 },
            ]),
            Err(CoreError::Validation(msg)) if msg.contains("more than once")
        );
    }

    #[test]
    fn allowed_transitions() {
        assert!(ensure_transition(OrderStatus::Paid, OrderStatus::Shipped).is_ok());
        assert!(ensure_transition(OrderStatus::Paid, OrderStatus::Completed).is_ok());
        assert!(ensure_transition(OrderStatus::Shipped, OrderStatus::Delivered).is_ok());
        assert!(ensure_transition(OrderStatus::Delivered, OrderStatus::Completed).is_ok());
    }

    #[test]
    fn rejected_transitions() {
        assert!(ensure_transition(OrderStatus::Shipped, OrderStatus::Paid).is_err());
        assert!(ensure_transition(OrderStatus::Completed, OrderStatus::Shipped).is_err());
        assert!(ensure_transition(OrderStatus::Paid, OrderStatus::Refunded).is_err());
        assert!(ensure_transition(OrderStatus::Refunded, OrderStatus::Completed).is_err());
    }

    #[test]
    fn refund_once() {
        assert!(ensure_refundable(OrderStatus::Completed).is_ok());
        assert_matches!(
            ensure_refundable(OrderStatus::Refunded),
            Err(CoreError::Conflict(_))
        );
    }
}
