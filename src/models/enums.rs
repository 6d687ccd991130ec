//! Enumeration types for constrained values.

use serde::{Deserialize, Deserializer, Serialize};

/// Direction of a transaction or category.
///
/// Anything the backend sends that is not `"income"` (in any letter
/// case) is treated as an expense, including a missing type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in.
    Income,
    /// Money going out. The fallback for unrecognized types.
    #[default]
    Expense,
}

impl TransactionKind {
    /// Parses a backend type string leniently: only `income` (in any
    /// case, without padding) is income.
    #[inline]
    #[must_use]
    pub fn from_type_str(value: &str) -> Self {
        if value.eq_ignore_ascii_case("income") {
            Self::Income
        } else {
            Self::Expense
        }
    }

    /// Lenient parse of an optional type string; `None` is an expense.
    #[inline]
    #[must_use]
    pub fn from_optional(value: Option<&str>) -> Self {
        value.map_or(Self::Expense, Self::from_type_str)
    }

    /// Returns `true` for [`TransactionKind::Income`].
    #[inline]
    #[must_use]
    pub const fn is_income(self) -> bool {
        matches!(self, Self::Income)
    }

    /// Lowercase name as used on the wire.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl core::fmt::Display for TransactionKind {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deserializes a [`TransactionKind`] from an optional, free-form type
/// string (`null`, missing and unknown values become expenses).
pub(crate) fn deserialize_lenient<'de, D>(
    deserializer: D,
) -> Result<TransactionKind, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(TransactionKind::from_optional(raw.as_deref()))
}

/// Kind of alert raised by anomaly detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// The latest month of a category is far above its history.
    SpendingSpike,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_income_case_insensitively() {
        assert_eq!(TransactionKind::from_type_str("income"), TransactionKind::Income);
        assert_eq!(TransactionKind::from_type_str("INCOME"), TransactionKind::Income);
    }

    #[test]
    fn padded_income_is_an_expense() {
        assert_eq!(TransactionKind::from_type_str(" income"), TransactionKind::Expense);
        assert_eq!(TransactionKind::from_type_str("income "), TransactionKind::Expense);
        assert_eq!(TransactionKind::from_type_str(" Income "), TransactionKind::Expense);
    }

    #[test]
    fn kind_defaults_to_expense() {
        assert_eq!(TransactionKind::from_type_str("expense"), TransactionKind::Expense);
        assert_eq!(TransactionKind::from_type_str("refund"), TransactionKind::Expense);
        assert_eq!(TransactionKind::from_type_str(""), TransactionKind::Expense);
        assert_eq!(TransactionKind::from_optional(None), TransactionKind::Expense);
    }

    #[test]
    fn kind_serde_lowercase() {
        let json = serde_json::to_string(&TransactionKind::Income).unwrap();
        assert_eq!(json, r#""income""#);
        let kind: TransactionKind = serde_json::from_str(r#""expense""#).unwrap();
        assert_eq!(kind, TransactionKind::Expense);
    }

    #[test]
    fn alert_kind_serde() {
        let json = serde_json::to_string(&AlertKind::SpendingSpike).unwrap();
        assert_eq!(json, r#""spending_spike""#);
    }
}
