//! Chronological month series for line charts.

use alloc::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::MonthFlow;
use crate::models::{MonthKey, Transaction};

/// One point of the monthly series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrendPoint {
    /// Month bucket.
    pub month: MonthKey,
    /// Income in the month.
    pub income: f64,
    /// Expense in the month.
    pub expense: f64,
    /// `income − expense`.
    pub savings: f64,
}

/// Builds the month series in ascending order.
///
/// Only months with at least one dated transaction appear; gaps in a
/// sparse history are not zero-filled.
#[must_use]
pub fn aggregate_monthly_trends(transactions: &[Transaction]) -> Vec<MonthlyTrendPoint> {
    let mut by_month: BTreeMap<MonthKey, MonthFlow> = BTreeMap::new();
    for tx in transactions {
        if let Some(month) = tx.month() {
            by_month.entry(month).or_default().record(tx);
        }
    }

    by_month
        .into_iter()
        .map(|(month, flow)| MonthlyTrendPoint {
            month,
            income: flow.income,
            expense: flow.expense,
            savings: flow.savings(),
        })
        .collect()
}
