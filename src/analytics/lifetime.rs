//! All-time income/expense summary.

use alloc::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{MonthFlow, month_divisor};
use crate::models::{MonthKey, Transaction};

/// All-time financial summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifetimeTotals {
    /// Sum of all income.
    pub total_income: f64,
    /// Sum of everything that is not income.
    pub total_expense: f64,
    /// `total_income − total_expense`; may be negative.
    pub total_savings: f64,
    /// Income per distinct month (at least one month).
    pub avg_monthly_income: f64,
    /// Expense per distinct month (at least one month).
    pub avg_monthly_expense: f64,
    /// Month with the highest `income − expense`.
    pub best_saving_month: Option<MonthKey>,
    /// Month with the highest expense.
    pub worst_spending_month: Option<MonthKey>,
    /// Per-month flows of dated transactions, in chronological order.
    pub monthly: BTreeMap<MonthKey, MonthFlow>,
}

/// Produces the all-time summary of `transactions`.
///
/// Undated transactions count toward the totals only. When several
/// months tie for best or worst, the earliest month wins.
#[must_use]
pub fn aggregate_lifetime_totals(transactions: &[Transaction]) -> LifetimeTotals {
    let mut totals = MonthFlow::default();
    let mut monthly: BTreeMap<MonthKey, MonthFlow> = BTreeMap::new();

    for tx in transactions {
        totals.record(tx);
        if let Some(month) = tx.month() {
            monthly.entry(month).or_default().record(tx);
        }
    }

    let mut best_saving: Option<(MonthKey, f64)> = None;
    let mut worst_spending: Option<(MonthKey, f64)> = None;
    for (&month, flow) in &monthly {
        if best_saving.is_none_or(|(_, best)| flow.savings() > best) {
            best_saving = Some((month, flow.savings()));
        }
        if worst_spending.is_none_or(|(_, worst)| flow.expense > worst) {
            worst_spending = Some((month, flow.expense));
        }
    }

    let divisor = month_divisor(monthly.len());
    LifetimeTotals {
        total_income: totals.income,
        total_expense: totals.expense,
        total_savings: totals.savings(),
        avg_monthly_income: totals.income / divisor,
        avg_monthly_expense: totals.expense / divisor,
        best_saving_month: best_saving.map(|(month, _)| month),
        worst_spending_month: worst_spending.map(|(month, _)| month),
        monthly,
    }
}
