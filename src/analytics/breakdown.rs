//! Expense totals grouped by category.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{by_amount_desc, distinct_month_count, month_divisor, percent_of};
use crate::models::Transaction;

/// One category's share of total expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    /// Category display name.
    pub category: String,
    /// Sum of expenses in this category.
    pub total: f64,
    /// Share of total expense in percent (0 when there is no expense).
    pub percent: f64,
    /// `total` divided by the global distinct month count.
    pub avg_monthly: f64,
}

/// Expense breakdown by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    /// Categories, largest total first.
    pub categories: Vec<CategoryShare>,
    /// Sum of all non-income amounts.
    pub total_expense: f64,
}

/// Groups non-income amounts by category name.
///
/// The monthly average divides by the number of distinct months across
/// *all* dated transactions (not per category), floored at 1, so the
/// averages are comparable across categories. Categories with equal
/// totals are ordered by name.
#[must_use]
pub fn aggregate_category_breakdown(transactions: &[Transaction]) -> CategoryBreakdown {
    let mut by_category: HashMap<&str, f64> = HashMap::new();
    let mut total_expense = 0.0_f64;

    for tx in transactions.iter().filter(|tx| !tx.is_income()) {
        total_expense += tx.amount;
        *by_category.entry(tx.category.name.as_str()).or_insert(0.0_f64) += tx.amount;
    }

    let divisor = month_divisor(distinct_month_count(transactions));
    let mut ranked: Vec<(&str, f64)> = by_category.into_iter().collect();
    ranked.sort_by(|&left, &right| by_amount_desc(left, right));

    let categories = ranked
        .into_iter()
        .map(|(name, total)| CategoryShare {
            category: name.to_owned(),
            total,
            percent: percent_of(total, total_expense),
            avg_monthly: total / divisor,
        })
        .collect();

    CategoryBreakdown {
        categories,
        total_expense,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::{approx, expense, income, salary_and_food, undated};
    use crate::models::TransactionKind;

    #[test]
    fn salary_and_food_scenario() {
        let breakdown = aggregate_category_breakdown(&salary_and_food());
        assert!(approx(breakdown.total_expense, 100.0));
        assert_eq!(breakdown.categories.len(), 1);
        let food = breakdown.categories.first().unwrap();
        assert_eq!(food.category, "Food");
        assert!(approx(food.total, 100.0));
        assert!(approx(food.percent, 100.0));
        assert!(approx(food.avg_monthly, 50.0));
    }

    #[test]
    fn empty_input() {
        let breakdown = aggregate_category_breakdown(&[]);
        assert!(breakdown.categories.is_empty());
        assert!(approx(breakdown.total_expense, 0.0));
    }

    #[test]
    fn sorted_descending_with_name_tiebreak() {
        let txs = vec![
            expense(10.0, "2024-01-01", "Travel"),
            expense(50.0, "2024-01-02", "Rent"),
            expense(10.0, "2024-01-03", "Books"),
            expense(5.0, "2024-01-04", "Rent"),
        ];
        let names: Vec<String> = aggregate_category_breakdown(&txs)
            .categories
            .into_iter()
            .map(|share| share.category)
            .collect();
        assert_eq!(names, ["Rent", "Books", "Travel"]);
    }

    #[test]
    fn percents_sum_to_hundred() {
        let txs = vec![
            expense(33.3, "2024-01-01", "A"),
            expense(66.6, "2024-02-01", "B"),
            expense(0.1, "2024-03-01", "C"),
            income(1000.0, "2024-03-01", "Salary"),
        ];
        let breakdown = aggregate_category_breakdown(&txs);
        let sum: f64 = breakdown.categories.iter().map(|share| share.percent).sum();
        assert!((sum - 100.0).abs() < 1e-6);
    }

    #[test]
    fn zero_expense_gives_zero_percent() {
        let txs = vec![expense(0.0, "2024-01-01", "Free")];
        let breakdown = aggregate_category_breakdown(&txs);
        assert!(approx(breakdown.categories.first().unwrap().percent, 0.0));
    }

    #[test]
    fn avg_monthly_uses_global_month_count() {
        let txs = vec![
            income(100.0, "2024-01-01", "Salary"),
            income(100.0, "2024-02-01", "Salary"),
            income(100.0, "2024-03-01", "Salary"),
            income(100.0, "2024-04-01", "Salary"),
            expense(80.0, "2024-04-10", "Gym"),
            undated(20.0, TransactionKind::Expense, "Gym"),
        ];
        let breakdown = aggregate_category_breakdown(&txs);
        let gym = breakdown.categories.first().unwrap();
        assert!(approx(gym.total, 100.0));
        assert!(approx(gym.avg_monthly, 25.0));
    }

    #[test]
    fn unrecognized_type_counts_as_expense() {
        let txs = vec![undated(7.0, TransactionKind::from_type_str("refund"), "Misc")];
        let breakdown = aggregate_category_breakdown(&txs);
        assert!(approx(breakdown.total_expense, 7.0));
    }
}
