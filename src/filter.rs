//! Composable transaction filtering.

use crate::models::{MonthKey, NaiveDate, Transaction, TransactionKind};

/// Composable filter over normalized transactions.
///
/// Use builder-style methods to chain multiple criteria. A transaction
/// must satisfy every set criterion to pass. Undated transactions never
/// pass a date or month criterion.
///
/// # Examples
///
/// ```
/// use budgetpilot::filter::TransactionFilter;
/// use budgetpilot::models::{NaiveDate, TransactionKind};
///
/// let filter = TransactionFilter::new()
///     .date_range(
///         NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///         NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
///     )
///     .kind(TransactionKind::Expense)
///     .category("food");
/// assert!(filter.apply(&[]).is_empty());
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionFilter {
    /// Start date (inclusive).
    pub date_from: Option<NaiveDate>,
    /// End date (inclusive).
    pub date_to: Option<NaiveDate>,
    /// Month bucket.
    pub month: Option<MonthKey>,
    /// Income or expense.
    pub kind: Option<TransactionKind>,
    /// Category name (case-insensitive, exact).
    pub category: Option<String>,
    /// Minimum amount (inclusive).
    pub min_amount: Option<f64>,
    /// Maximum amount (inclusive).
    pub max_amount: Option<f64>,
}

impl TransactionFilter {
    /// Creates an empty filter that matches all transactions.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to transactions within the given date range (inclusive).
    #[inline]
    #[must_use]
    pub const fn date_range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    /// Restricts to transactions dated within `month`.
    #[inline]
    #[must_use]
    pub const fn month(mut self, month: MonthKey) -> Self {
        self.month = Some(month);
        self
    }

    /// Restricts to income or to expenses.
    #[inline]
    #[must_use]
    pub const fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restricts to one category name (case-insensitive).
    #[inline]
    #[must_use]
    pub fn category<T: Into<String>>(mut self, name: T) -> Self {
        self.category = Some(name.into());
        self
    }

    /// Restricts to amounts within `[min, max]`.
    #[inline]
    #[must_use]
    pub const fn amount_range(mut self, min: f64, max: f64) -> Self {
        self.min_amount = Some(min);
        self.max_amount = Some(max);
        self
    }

    /// Returns `true` if the transaction satisfies all set criteria.
    #[inline]
    #[must_use]
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.matches_date(tx)
            && self.matches_month(tx)
            && self.matches_kind(tx)
            && self.matches_category(tx)
            && self.matches_amount(tx)
    }

    /// Transactions that pass the filter, in input order.
    #[inline]
    #[must_use]
    pub fn apply<'tx>(&self, transactions: &'tx [Transaction]) -> Vec<&'tx Transaction> {
        transactions.iter().filter(|tx| self.matches(tx)).collect()
    }

    /// Checks date range criteria.
    fn matches_date(&self, tx: &Transaction) -> bool {
        self.date_from
            .is_none_or(|from| tx.date.is_some_and(|date| date >= from))
            && self
                .date_to
                .is_none_or(|to| tx.date.is_some_and(|date| date <= to))
    }

    /// Checks month criteria.
    fn matches_month(&self, tx: &Transaction) -> bool {
        self.month.is_none_or(|month| tx.month() == Some(month))
    }

    /// Checks kind criteria.
    fn matches_kind(&self, tx: &Transaction) -> bool {
        self.kind.is_none_or(|kind| tx.kind == kind)
    }

    /// Checks category criteria.
    fn matches_category(&self, tx: &Transaction) -> bool {
        self.category
            .as_ref()
            .is_none_or(|name| tx.category.name.to_lowercase() == name.to_lowercase())
    }

    /// Checks amount criteria.
    fn matches_amount(&self, tx: &Transaction) -> bool {
        self.min_amount.is_none_or(|min| tx.amount >= min)
            && self.max_amount.is_none_or(|max| tx.amount <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryRef;

    fn test_transaction(amount: f64, kind: TransactionKind, date: Option<NaiveDate>, category: &str) -> Transaction {
        Transaction::new(amount, kind, date, CategoryRef::named(category))
    }

    fn day(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, month, day)
    }

    #[test]
    fn filter_default_matches_all() {
        let filter = TransactionFilter::new();
        let undated = test_transaction(1.0, TransactionKind::Expense, None, "Food");
        assert!(filter.matches(&undated));
    }

    #[test]
    fn filter_date_range() {
        let filter = TransactionFilter::new().date_range(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        );
        let inside = test_transaction(1.0, TransactionKind::Expense, day(2024, 3, 15), "Food");
        let before = test_transaction(1.0, TransactionKind::Expense, day(2023, 12, 31), "Food");
        let after = test_transaction(1.0, TransactionKind::Expense, day(2024, 7, 1), "Food");
        let on_boundary = test_transaction(1.0, TransactionKind::Expense, day(2024, 6, 30), "Food");
        let undated = test_transaction(1.0, TransactionKind::Expense, None, "Food");

        assert!(filter.matches(&inside));
        assert!(!filter.matches(&before));
        assert!(!filter.matches(&after));
        assert!(filter.matches(&on_boundary));
        assert!(!filter.matches(&undated));
    }

    #[test]
    fn filter_month() {
        let filter = TransactionFilter::new().month("2024-02".parse().unwrap());
        let inside = test_transaction(1.0, TransactionKind::Expense, day(2024, 2, 29), "Food");
        let outside = test_transaction(1.0, TransactionKind::Expense, day(2024, 3, 1), "Food");
        let undated = test_transaction(1.0, TransactionKind::Expense, None, "Food");

        assert!(filter.matches(&inside));
        assert!(!filter.matches(&outside));
        assert!(!filter.matches(&undated));
    }

    #[test]
    fn filter_kind_and_category_case_insensitive() {
        let filter = TransactionFilter::new()
            .kind(TransactionKind::Expense)
            .category("food");
        let matching = test_transaction(5.0, TransactionKind::Expense, None, "FOOD");
        let wrong_kind = test_transaction(5.0, TransactionKind::Income, None, "Food");
        let wrong_category = test_transaction(5.0, TransactionKind::Expense, None, "Seafood");

        assert!(filter.matches(&matching));
        assert!(!filter.matches(&wrong_kind));
        assert!(!filter.matches(&wrong_category));
    }

    #[test]
    fn filter_amount_range_and_apply() {
        let filter = TransactionFilter::new().amount_range(50.0, 200.0);
        let txs = vec![
            test_transaction(100.0, TransactionKind::Expense, None, "A"),
            test_transaction(10.0, TransactionKind::Expense, None, "B"),
            test_transaction(500.0, TransactionKind::Expense, None, "C"),
            test_transaction(200.0, TransactionKind::Income, None, "D"),
        ];
        let names: Vec<&str> = filter
            .apply(&txs)
            .into_iter()
            .map(|tx| tx.category.name.as_str())
            .collect();
        assert_eq!(names, ["A", "D"]);
    }
}
