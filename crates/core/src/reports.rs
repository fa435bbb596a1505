//! Financial report figures derived from payment and expense totals.

use chrono::{Days, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::CoreError;
use crate::expenses::ExpenseKind;
use crate::money::round_money;
use crate::payments::PaymentType;
use crate::types::{DbId, Timestamp};

/// Longest reporting period accepted, in days.
pub const MAX_PERIOD_DAYS: u64 = 366 * 5;

/// Headline figures for a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FinancialSummary {
    pub gross_sales: Decimal,
    pub refunds: Decimal,
    pub net_revenue: Decimal,
    pub vendor_payments: Decimal,
    pub expenses: Decimal,
    pub adjustments: Decimal,
    /// Sum of every signed payment in the period.
    pub net_cash_flow: Decimal,
    pub order_count: i64,
    pub average_order_value: Decimal,
}

impl FinancialSummary {
    /// Build the summary from signed per-type payment totals.
    ///
    /// Outflows are reported as positive magnitudes; adjustments keep their sign.
    pub fn from_totals(totals: &[(PaymentType, Decimal)], order_count: i64) -> Self {
        let mut summary = Self {
            order_count,
            ..Self::default()
        };
        for &(kind, amount) in totals {
            summary.net_cash_flow += amount;
            match kind {
                PaymentType::Sale => summary.gross_sales += amount,
                PaymentType::Refund => summary.refunds += amount.abs(),
                PaymentType::Vendor => summary.vendor_payments += amount.abs(),
                PaymentType::Expense => summary.expenses += amount.abs(),
                PaymentType::Adjustment => summary.adjustments += amount,
            }
        }
        summary.net_revenue = summary.gross_sales - summary.refunds;
        if order_count > 0 {
            summary.average_order_value =
                round_money(summary.gross_sales / Decimal::from(order_count));
        }
        summary
    }
}

/// Expense total of one category, as loaded from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category_id: DbId,
    pub name: String,
    pub kind: ExpenseKind,
    pub color: String,
    pub total: Decimal,
}

/// One category's slice of the expense breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryShare {
    pub category_id: DbId,
    pub name: String,
    pub kind: ExpenseKind,
    pub color: String,
    pub total: Decimal,
    /// Percentage of all expenses in the period, two decimal places.
    pub share: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpenseBreakdown {
    pub total: Decimal,
    pub fixed_total: Decimal,
    pub variable_total: Decimal,
    pub categories: Vec<CategoryShare>,
}

/// Compute category shares and the fixed/variable split, largest first.
pub fn expense_breakdown(rows: Vec<CategoryTotal>) -> ExpenseBreakdown {
    let total: Decimal = rows.iter().map(|r| r.total).sum();
    let fixed_total: Decimal = rows
        .iter()
        .filter(|r| r.kind == ExpenseKind::Fixed)
        .map(|r| r.total)
        .sum();

    let mut categories: Vec<CategoryShare> = rows
        .into_iter()
        .map(|r| {
            let share = if total.is_zero() {
                Decimal::ZERO
            } else {
                round_money(r.total * Decimal::ONE_HUNDRED / total)
            };
            CategoryShare {
                category_id: r.category_id,
                name: r.name,
                kind: r.kind,
                color: r.color,
                total: r.total,
                share,
            }
        })
        .collect();
    categories.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

    ExpenseBreakdown {
        total,
        fixed_total,
        variable_total: total - fixed_total,
        categories,
    }
}

/// Validate an inclusive `from..=to` date range.
pub fn validate_period(from: NaiveDate, to: NaiveDate) -> Result<(), CoreError> {
    if from > to {
        return Err(CoreError::Validation(format!(
            "Period start {from} is after its end {to}"
        )));
    }
    let days = (to - from).num_days().unsigned_abs();
    if days > MAX_PERIOD_DAYS {
        return Err(CoreError::Validation(format!(
            "Period may span at most {MAX_PERIOD_DAYS} days, got {days}"
        )));
    }
    Ok(())
}

/// Half-open UTC timestamp bounds `[from 00:00, to + 1 day 00:00)`.
pub fn period_bounds(from: NaiveDate, to: NaiveDate) -> (Timestamp, Timestamp) {
    let start = from.and_time(NaiveTime::MIN).and_utc();
    let end = to
        .checked_add_days(Days::new(1))
        .unwrap_or(to)
        .and_time(NaiveTime::MIN)
        .and_utc();
    (start, end)
}
