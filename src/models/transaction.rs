//! Normalized transaction model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{CategoryId, MonthKey, TransactionId, TransactionKind};

/// Display name used when a transaction carries no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A resolved category reference: the backend id (when known) plus the
/// display name used for grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryRef {
    /// Backend identifier, if the record carried one.
    pub id: Option<CategoryId>,
    /// Name used for grouping and display.
    pub name: String,
}

impl CategoryRef {
    /// A reference with only a display name.
    #[inline]
    #[must_use]
    pub fn named<N: Into<String>>(name: N) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    /// The placeholder for transactions without a category.
    #[inline]
    #[must_use]
    pub fn uncategorized() -> Self {
        Self::named(UNCATEGORIZED)
    }

    /// Key used to match budgets: the id when present, else the name.
    #[inline]
    #[must_use]
    pub fn budget_key(&self) -> &str {
        self.id.as_ref().map_or(self.name.as_str(), CategoryId::as_inner)
    }
}

impl Default for CategoryRef {
    #[inline]
    fn default() -> Self {
        Self::uncategorized()
    }
}

/// A single income or expense event, normalized at ingestion.
///
/// See [`crate::ingest`] for how raw backend records become this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Backend identifier.
    pub id: Option<TransactionId>,
    /// Amount in currency units (0 when the source had none).
    pub amount: f64,
    /// Income or expense.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Calendar date; `None` when the source date was missing or invalid.
    pub date: Option<NaiveDate>,
    /// Resolved category.
    pub category: CategoryRef,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Transaction {
    /// Creates a transaction without id or description.
    #[inline]
    #[must_use]
    pub const fn new(
        amount: f64,
        kind: TransactionKind,
        date: Option<NaiveDate>,
        category: CategoryRef,
    ) -> Self {
        Self {
            id: None,
            amount,
            kind,
            date,
            category,
            description: None,
        }
    }

    /// Month bucket of this transaction, if it is dated.
    #[inline]
    #[must_use]
    pub fn month(&self) -> Option<MonthKey> {
        self.date.map(MonthKey::from_date)
    }

    /// Returns `true` for income transactions.
    #[inline]
    #[must_use]
    pub const fn is_income(&self) -> bool {
        self.kind.is_income()
    }
}
