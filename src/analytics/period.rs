//! Single-month views: the dashboard summary and the month-over-month
//! comparison.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{MonthFlow, by_amount_desc};
use crate::models::{MonthKey, Transaction};

/// Expense of one category within a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpend {
    /// Category display name.
    pub category: String,
    /// Expense in the month.
    pub amount: f64,
}

/// Totals for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    /// The summarized month.
    pub month: MonthKey,
    /// Income in the month.
    pub income: f64,
    /// Expense in the month.
    pub expense: f64,
    /// `income − expense`.
    pub savings: f64,
    /// Expense per category, largest first.
    pub by_category: Vec<CategorySpend>,
}

/// Flows of a month next to those of the month before.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthComparison {
    /// The compared month.
    pub month: MonthKey,
    /// Flows of `month`.
    pub current: MonthFlow,
    /// The month before, unless `month` is the first representable one.
    pub previous_month: Option<MonthKey>,
    /// Flows of `previous_month` (zero when absent).
    pub previous: MonthFlow,
}

impl MonthComparison {
    /// Expense change in percent; `None` without previous expense.
    #[inline]
    #[must_use]
    pub fn expense_change_pct(&self) -> Option<f64> {
        (self.previous.expense > 0.0_f64).then(|| {
            (self.current.expense - self.previous.expense) / self.previous.expense * 100.0_f64
        })
    }
}

/// Flows of the transactions dated within `month`.
fn flow_of(transactions: &[Transaction], month: MonthKey) -> MonthFlow {
    let mut flow = MonthFlow::default();
    for tx in transactions.iter().filter(|tx| tx.month() == Some(month)) {
        flow.record(tx);
    }
    flow
}

/// Summarizes `month`; undated transactions are ignored.
#[must_use]
pub fn month_summary(transactions: &[Transaction], month: MonthKey) -> MonthSummary {
    let mut flow = MonthFlow::default();
    let mut by_category: HashMap<&str, f64> = HashMap::new();

    for tx in transactions.iter().filter(|tx| tx.month() == Some(month)) {
        flow.record(tx);
        if !tx.is_income() {
            *by_category.entry(tx.category.name.as_str()).or_insert(0.0_f64) += tx.amount;
        }
    }

    let mut ranked: Vec<(&str, f64)> = by_category.into_iter().collect();
    ranked.sort_by(|&left, &right| by_amount_desc(left, right));

    MonthSummary {
        month,
        income: flow.income,
        expense: flow.expense,
        savings: flow.savings(),
        by_category: ranked
            .into_iter()
            .map(|(category, amount)| CategorySpend {
                category: category.to_owned(),
                amount,
            })
            .collect(),
    }
}

/// Compares `month` with the month before it.
#[must_use]
pub fn compare_with_previous(transactions: &[Transaction], month: MonthKey) -> MonthComparison {
    let previous_month = month.previous();
    MonthComparison {
        month,
        current: flow_of(transactions, month),
        previous_month,
        previous: previous_month.map_or_else(MonthFlow::default, |prev| flow_of(transactions, prev)),
    }
}
