//! Category model and the built-in default category lists.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{CategoryId, TransactionKind};

/// Built-in income category names offered when the user has none.
pub const DEFAULT_INCOME_CATEGORIES: [&str; 6] =
    ["Salary", "Freelance", "Investment", "Interest", "Bonus", "Other"];

/// Built-in expense category names offered when the user has none.
pub const DEFAULT_EXPENSE_CATEGORIES: [&str; 10] = [
    "Rent",
    "Food",
    "Transport",
    "Travel",
    "Shopping",
    "Bills",
    "Entertainment",
    "Health",
    "Education",
    "Other",
];

/// A user-defined label classifying transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier (`_id` or `id` on the wire).
    #[serde(alias = "_id")]
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Whether the category classifies income or expenses.
    #[serde(
        rename = "type",
        default,
        deserialize_with = "super::enums::deserialize_lenient"
    )]
    pub kind: TransactionKind,
    /// Inactive categories are hidden from pickers but still resolve.
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Serde default for [`Category::active`].
const fn default_active() -> bool {
    true
}

impl Category {
    /// Creates an active category.
    #[inline]
    #[must_use]
    pub fn new<N: Into<String>>(id: CategoryId, name: N, kind: TransactionKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            active: true,
        }
    }

    /// Creates a built-in category whose id is its name.
    #[inline]
    #[must_use]
    pub fn builtin(name: &str, kind: TransactionKind) -> Self {
        Self::new(CategoryId::from(name), name, kind)
    }
}

/// Merges the user's categories with the built-in defaults.
///
/// User categories matching `filter` come first, deduplicated by trimmed
/// name (first occurrence wins); defaults whose name is not already taken
/// follow. `None` selects both kinds.
#[must_use]
pub fn merge_with_defaults(
    categories: &[Category],
    filter: Option<TransactionKind>,
) -> Vec<Category> {
    let wanted = |kind: TransactionKind| filter.is_none_or(|selected| selected == kind);
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::new();

    for category in categories.iter().filter(|cat| wanted(cat.kind)) {
        let name = category.name.trim();
        if seen.insert(name.to_owned()) {
            merged.push(Category {
                name: name.to_owned(),
                ..category.clone()
            });
        }
    }

    let defaults = DEFAULT_INCOME_CATEGORIES
        .iter()
        .map(|name| (*name, TransactionKind::Income))
        .chain(
            DEFAULT_EXPENSE_CATEGORIES
                .iter()
                .map(|name| (*name, TransactionKind::Expense)),
        );
    for (name, kind) in defaults.filter(|&(_, kind)| wanted(kind)) {
        if seen.insert(name.to_owned()) {
            merged.push(Category::builtin(name, kind));
        }
    }

    merged
}
