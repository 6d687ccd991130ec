//! Headline indicators derived from the other aggregations.

use serde::{Deserialize, Serialize};

use super::{aggregate_category_breakdown, aggregate_lifetime_totals, aggregate_monthly_trends};
use crate::models::Transaction;

/// Buckets in the recent spending window.
const RECENT_MONTHS: usize = 6;

/// Buckets in the year-over-year window.
const YEAR_MONTHS: usize = 12;

/// Headline indicators for the insights view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    /// Expense of the latest 6 month buckets vs the 6 before them.
    pub spending_growth_pct: f64,
    /// Savings as a percentage of income; `None` without income.
    pub savings_ratio: Option<f64>,
    /// Category with the highest expense.
    pub biggest_category: Option<String>,
    /// Expense of [`Insights::biggest_category`].
    pub biggest_category_amount: Option<f64>,
    /// Expense of the latest 12 month buckets vs the 12 before them.
    pub yoy_change_pct: f64,
}

/// Sum of `values[start..end]`, clamped to the slice.
fn window_sum(values: &[f64], start: usize, end: usize) -> f64 {
    values
        .iter()
        .skip(start)
        .take(end.saturating_sub(start))
        .sum()
}

/// Percent change of `recent` over `prior`.
///
/// A zero `prior` is replaced by 1, which can exaggerate growth for short
/// histories. Two empty windows are no growth at all.
fn growth_pct(recent: f64, prior: f64) -> f64 {
    if recent == 0.0_f64 && prior == 0.0_f64 {
        return 0.0_f64;
    }
    let denominator = if prior == 0.0_f64 { 1.0_f64 } else { prior };
    let pct = (recent - denominator) / denominator * 100.0_f64;
    if pct.is_finite() { pct } else { 0.0_f64 }
}

/// Derives the headline indicators.
///
/// The windows count month *buckets* present in the monthly series, not
/// calendar months: with gaps in the history, "the last 12" can span more
/// than a year.
#[must_use]
pub fn compute_insights(transactions: &[Transaction]) -> Insights {
    let lifetime = aggregate_lifetime_totals(transactions);
    let breakdown = aggregate_category_breakdown(transactions);
    let expenses: Vec<f64> = aggregate_monthly_trends(transactions)
        .iter()
        .map(|point| point.expense)
        .collect();

    let len = expenses.len();
    let year_start = len.saturating_sub(YEAR_MONTHS);
    let recent_start = len.saturating_sub(RECENT_MONTHS);

    let recent_spend = window_sum(&expenses, recent_start, len);
    let prior_spend = window_sum(&expenses, year_start, recent_start);
    let year_spend = window_sum(&expenses, year_start, len);
    let prior_year_spend = window_sum(&expenses, len.saturating_sub(2 * YEAR_MONTHS), year_start);

    let savings_ratio = (lifetime.total_income > 0.0_f64)
        .then(|| lifetime.total_savings / lifetime.total_income * 100.0_f64)
        .filter(|ratio| ratio.is_finite());

    let biggest = breakdown.categories.into_iter().next();

    Insights {
        spending_growth_pct: growth_pct(recent_spend, prior_spend),
        savings_ratio,
        biggest_category_amount: biggest.as_ref().map(|share| share.total),
        biggest_category: biggest.map(|share| share.category),
        yoy_change_pct: growth_pct(year_spend, prior_year_spend),
    }
}
