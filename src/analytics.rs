//! Client-side financial analytics over normalized transactions.
//!
//! Every function here is pure and total: it reads a slice of
//! [`Transaction`] and returns plain data, never an error. Empty input is
//! a valid zero state (sums are 0, ratios are `None`).
//!
//! Month-keyed structures only see dated transactions; type totals see
//! all of them.

mod anomaly;
mod breakdown;
mod forecast;
mod insights;
mod lifetime;
mod monthly;
mod period;
mod tips;
mod top;
mod trends;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{MonthKey, Transaction};

pub use anomaly::{
    Alert, MAD_THRESHOLD, ZSCORE_THRESHOLD, detect_anomalies_mad, detect_anomalies_zscore,
};
pub use breakdown::{CategoryBreakdown, CategoryShare, aggregate_category_breakdown};
pub use forecast::{
    FORECAST_WINDOW, Forecast, forecast_next_month, linear_trend_slope, rolling_average,
    weighted_moving_average,
};
pub use insights::{Insights, compute_insights};
pub use lifetime::{LifetimeTotals, aggregate_lifetime_totals};
pub use monthly::{MonthlyTrendPoint, aggregate_monthly_trends};
pub use period::{
    CategorySpend, MonthComparison, MonthSummary, compare_with_previous, month_summary,
};
pub use tips::{SpendingAnalysis, Tip, TipReport, recommend_tips};
pub use top::{DEFAULT_TOP_LIMIT, top_spending_transactions};
pub use trends::{
    CategoryTrend, DEFAULT_MAJOR_CATEGORIES, TREND_WINDOW, compute_category_trends,
    monthly_category_history,
};

/// Income and expense sums for one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthFlow {
    /// Sum of income amounts.
    pub income: f64,
    /// Sum of expense amounts.
    pub expense: f64,
}

impl MonthFlow {
    /// `income − expense`.
    #[inline]
    #[must_use]
    pub fn savings(&self) -> f64 {
        self.income - self.expense
    }

    /// Adds a transaction to the matching side.
    #[inline]
    pub fn record(&mut self, tx: &Transaction) {
        if tx.is_income() {
            self.income += tx.amount;
        } else {
            self.expense += tx.amount;
        }
    }
}

/// Number of distinct months among dated transactions.
pub(crate) fn distinct_month_count(transactions: &[Transaction]) -> usize {
    transactions
        .iter()
        .filter_map(Transaction::month)
        .collect::<HashSet<MonthKey>>()
        .len()
}

/// A count as a float operand.
#[allow(
    clippy::cast_precision_loss,
    reason = "counts of months and values are far below 2^52"
)]
pub(crate) const fn count_as_f64(count: usize) -> f64 {
    count as f64
}

/// Month count as a divisor, floored at 1.
pub(crate) fn month_divisor(months: usize) -> f64 {
    count_as_f64(months.max(1))
}

/// `part / whole × 100`, or 0 when `whole` is not positive.
pub(crate) fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0_f64 {
        part / whole * 100.0_f64
    } else {
        0.0_f64
    }
}

/// Orders `(name, amount)` pairs by amount descending, then by name.
pub(crate) fn by_amount_desc(left: (&str, f64), right: (&str, f64)) -> core::cmp::Ordering {
    right.1.total_cmp(&left.1).then_with(|| left.0.cmp(right.0))
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Transaction builders shared by the analytics tests.

    use chrono::NaiveDate;

    use crate::models::{CategoryRef, Transaction, TransactionKind};

    /// A dated transaction; `date` is `YYYY-MM-DD`.
    pub(crate) fn tx(amount: f64, kind: TransactionKind, date: &str, category: &str) -> Transaction {
        Transaction::new(
            amount,
            kind,
            NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            CategoryRef::named(category),
        )
    }

    /// A dated expense.
    pub(crate) fn expense(amount: f64, date: &str, category: &str) -> Transaction {
        tx(amount, TransactionKind::Expense, date, category)
    }

    /// A dated income.
    pub(crate) fn income(amount: f64, date: &str, category: &str) -> Transaction {
        tx(amount, TransactionKind::Income, date, category)
    }

    /// An undated transaction.
    pub(crate) fn undated(amount: f64, kind: TransactionKind, category: &str) -> Transaction {
        Transaction::new(amount, kind, None, CategoryRef::named(category))
    }

    /// The three-transaction scenario used across the analytics tests.
    pub(crate) fn salary_and_food() -> Vec<Transaction> {
        vec![
            income(100.0, "2024-01-15", "Salary"),
            expense(40.0, "2024-01-20", "Food"),
            expense(60.0, "2024-02-05", "Food"),
        ]
    }

    /// Float comparison with a small tolerance.
    pub(crate) fn approx(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{approx, expense, income, salary_and_food, undated};
    use super::*;
    use crate::models::TransactionKind;

    #[test]
    fn month_flow_records_by_kind() {
        let mut flow = MonthFlow::default();
        flow.record(&income(10.0, "2024-01-01", "Salary"));
        flow.record(&expense(4.0, "2024-01-02", "Food"));
        assert!(approx(flow.income, 10.0));
        assert!(approx(flow.expense, 4.0));
        assert!(approx(flow.savings(), 6.0));
    }

    #[test]
    fn distinct_months_skip_undated() {
        let mut txs = salary_and_food();
        txs.push(undated(5.0, TransactionKind::Expense, "Food"));
        assert_eq!(distinct_month_count(&txs), 2);
        assert_eq!(distinct_month_count(&[]), 0);
        assert!(approx(month_divisor(0), 1.0));
    }

    #[test]
    fn percent_guards_zero_total() {
        assert!(approx(percent_of(25.0, 100.0), 25.0));
        assert!(approx(percent_of(25.0, 0.0), 0.0));
    }
}
