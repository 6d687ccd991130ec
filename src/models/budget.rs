//! Monthly per-category budget model.

use alloc::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::MonthKey;

/// Budget amounts keyed by month, then by category key.
///
/// The category key is the category id, or the category name for
/// built-in defaults. Serialized as
/// `{"2024-01": {"<category key>": 250.0}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlyBudgets(BTreeMap<MonthKey, BTreeMap<String, f64>>);

impl MonthlyBudgets {
    /// Creates an empty budget table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Budget for a category in a month; 0 when none was set.
    #[inline]
    #[must_use]
    pub fn amount_for(&self, month: MonthKey, category_key: &str) -> f64 {
        self.0
            .get(&month)
            .and_then(|per_category| per_category.get(category_key))
            .copied()
            .unwrap_or(0.0_f64)
    }

    /// Sets (or replaces) the budget for a category in a month.
    #[inline]
    pub fn set(&mut self, month: MonthKey, category_key: String, amount: f64) {
        _ = self.0.entry(month).or_default().insert(category_key, amount);
    }

    /// All budgets set for a month, by category key.
    #[inline]
    #[must_use]
    pub fn for_month(&self, month: MonthKey) -> Option<&BTreeMap<String, f64>> {
        self.0.get(&month)
    }

    /// Returns `true` if no budget has been set for any month.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeMap::is_empty)
    }
}
