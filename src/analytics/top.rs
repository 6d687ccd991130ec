//! Largest individual expenses.

use crate::models::Transaction;

/// Number of transactions returned by default.
pub const DEFAULT_TOP_LIMIT: usize = 10;

/// The `limit` largest non-income transactions, largest first.
///
/// The sort is stable: equal amounts keep their input order.
#[must_use]
pub fn top_spending_transactions(transactions: &[Transaction], limit: usize) -> Vec<&Transaction> {
    let mut expenses: Vec<&Transaction> = transactions.iter().filter(|tx| !tx.is_income()).collect();
    expenses.sort_by(|left, right| right.amount.total_cmp(&left.amount));
    expenses.truncate(limit);
    expenses
}
