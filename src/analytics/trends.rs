//! Per-category month series for the major spending categories.

use alloc::collections::BTreeMap;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::by_amount_desc;
use crate::models::{MonthKey, Transaction};

/// Number of categories returned by default.
pub const DEFAULT_MAJOR_CATEGORIES: usize = 8;

/// Trailing window (in months) for the percent-change indicator.
pub const TREND_WINDOW: usize = 6;

/// Month-aligned expense series of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTrend {
    /// Category display name.
    pub category: String,
    /// Every month present in the input, ascending.
    pub months: Vec<MonthKey>,
    /// Expense of this category in the matching month (0 if none).
    pub values: Vec<f64>,
    /// Percent change across the trailing window; `None` when there is
    /// not enough data or the window starts at 0.
    pub pct_change: Option<f64>,
}

/// Expense per category per month, over dated transactions.
struct CategoryMatrix<'tx> {
    /// Union of all months (income months included), ascending.
    months: Vec<MonthKey>,
    /// Category name → month → expense.
    cells: HashMap<&'tx str, HashMap<MonthKey, f64>>,
}

impl<'tx> CategoryMatrix<'tx> {
    /// Builds the matrix from dated transactions.
    fn build(transactions: &'tx [Transaction]) -> Self {
        let mut seen_months: HashSet<MonthKey> = HashSet::new();
        let mut cells: HashMap<&'tx str, HashMap<MonthKey, f64>> = HashMap::new();

        for tx in transactions {
            let Some(month) = tx.month() else {
                continue;
            };
            _ = seen_months.insert(month);
            if tx.is_income() {
                continue;
            }
            *cells
                .entry(tx.category.name.as_str())
                .or_default()
                .entry(month)
                .or_insert(0.0_f64) += tx.amount;
        }

        let mut months: Vec<MonthKey> = seen_months.into_iter().collect();
        months.sort_unstable();
        Self { months, cells }
    }

    /// Category names ranked by total expense (ties by name).
    fn ranked(&self) -> Vec<&'tx str> {
        let mut totals: Vec<(&str, f64)> = self
            .cells
            .iter()
            .map(|(&name, per_month)| (name, per_month.values().sum()))
            .collect();
        totals.sort_by(|&left, &right| by_amount_desc(left, right));
        totals.into_iter().map(|(name, _)| name).collect()
    }

    /// The category's value for every month (0 where absent).
    fn series(&self, category: &str) -> Vec<f64> {
        let per_month = self.cells.get(category);
        self.months
            .iter()
            .map(|month| {
                per_month
                    .and_then(|cells| cells.get(month))
                    .copied()
                    .unwrap_or(0.0_f64)
            })
            .collect()
    }
}

/// Percent change from the first to the last value of the trailing
/// [`TREND_WINDOW`].
fn trailing_pct_change(values: &[f64]) -> Option<f64> {
    let window = values.get(values.len().saturating_sub(TREND_WINDOW)..)?;
    if window.len() < 2 {
        return None;
    }
    let first = *window.first()?;
    let last = *window.last()?;
    (first > 0.0_f64).then(|| (last - first) / first * 100.0_f64)
}

/// Series and trend indicator for the `major_n` highest-expense
/// categories.
///
/// Every returned trend shares the same `months` (all months present in
/// the input), so `values.len() == months.len()`.
#[must_use]
pub fn compute_category_trends(transactions: &[Transaction], major_n: usize) -> Vec<CategoryTrend> {
    let matrix = CategoryMatrix::build(transactions);
    matrix
        .ranked()
        .into_iter()
        .take(major_n)
        .map(|category| {
            let values = matrix.series(category);
            CategoryTrend {
                category: category.to_owned(),
                months: matrix.months.clone(),
                pct_change: trailing_pct_change(&values),
                values,
            }
        })
        .collect()
}

/// Month-aligned expense history of every expense category, keyed by
/// category name.
#[must_use]
pub fn monthly_category_history(transactions: &[Transaction]) -> BTreeMap<String, Vec<f64>> {
    let matrix = CategoryMatrix::build(transactions);
    matrix
        .cells
        .keys()
        .map(|&category| (category.to_owned(), matrix.series(category)))
        .collect()
}
