//! Normalization of raw backend transaction records.
//!
//! The backend is loose about shapes: amounts arrive as numbers or
//! strings, dates in several formats, and the category as an id, a name
//! or an embedded object. Everything is resolved here, once, into
//! [`Transaction`] so that the analytics never inspect raw shapes.

use core::ops::RangeInclusive;
use std::collections::HashMap;

use chrono::{DateTime, Datelike as _, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{
    Category, CategoryId, CategoryRef, MonthKey, Transaction, TransactionId, TransactionKind,
};

/// Naive timestamp layouts accepted for dates without an offset.
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Years whose months print and parse back as `YYYY-MM`.
const MONTH_KEY_YEARS: RangeInclusive<i32> = 0..=9999;

/// An amount as sent by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    /// A JSON number.
    Number(f64),
    /// A numeric string such as `"12.50"`.
    Text(String),
    /// Anything else; counts as 0.
    Other(serde_json::Value),
}

impl RawAmount {
    /// Numeric value; unparseable or non-finite amounts are 0.
    #[inline]
    #[must_use]
    pub fn value(&self) -> f64 {
        let parsed = match *self {
            Self::Number(number) => number,
            Self::Text(ref text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    0.0_f64
                } else {
                    trimmed.parse().unwrap_or(0.0_f64)
                }
            }
            Self::Other(_) => 0.0_f64,
        };
        if parsed.is_finite() { parsed } else { 0.0_f64 }
    }
}

/// A date as sent by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    /// An ISO 8601 / RFC 3339 string.
    Text(String),
    /// Milliseconds since the Unix epoch.
    Millis(f64),
    /// Anything else; treated as undated.
    Other(serde_json::Value),
}

impl RawDate {
    /// Calendar date, or `None` if the value cannot be interpreted.
    #[inline]
    #[must_use]
    pub fn to_date(&self) -> Option<NaiveDate> {
        match *self {
            Self::Text(ref text) => parse_date(text),
            Self::Millis(millis) => millis_to_date(millis),
            Self::Other(_) => None,
        }
    }
}

/// An embedded category object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCategoryObject {
    /// Backend id (`_id` or `id`).
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A category as sent by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCategory {
    /// A category id or a category name.
    Text(String),
    /// An embedded category object.
    Object(RawCategoryObject),
    /// Anything else.
    Other(serde_json::Value),
}

/// A transaction record exactly as the backend returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Backend id (`_id` or `id`).
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<RawAmount>,
    /// Free-form type; only `"income"` (any case) is income.
    #[serde(
        default,
        rename = "type",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_type"
    )]
    pub kind: Option<String>,
    /// Date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<RawDate>,
    /// Category id, name or object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<RawCategory>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Accepts any JSON value for `type`, keeping only strings.
fn lenient_type<'de, D>(deserializer: D) -> core::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|val| val.as_str().map(str::to_owned)))
}

/// Lookup from category id to display name.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    /// Names keyed by id.
    names: HashMap<CategoryId, String>,
}

impl CategoryIndex {
    /// Builds an index over the given categories.
    #[inline]
    #[must_use]
    pub fn new(categories: &[Category]) -> Self {
        let names = categories
            .iter()
            .map(|category| (category.id.clone(), category.name.clone()))
            .collect();
        Self { names }
    }

    /// Display name for a category id, if known.
    #[inline]
    #[must_use]
    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.names
            .get(&CategoryId::from(id))
            .map(String::as_str)
    }

    /// Resolves a raw category into a [`CategoryRef`].
    ///
    /// - object with a non-empty name: that name
    /// - object with only an id: resolved like a string
    /// - string matching a known id: the indexed name
    /// - any other non-empty string: used as the name
    /// - absent or empty: [`crate::models::UNCATEGORIZED`]
    #[must_use]
    pub fn resolve(&self, raw: Option<&RawCategory>) -> CategoryRef {
        match raw {
            Some(&RawCategory::Text(ref text)) => self.resolve_text(text),
            Some(&RawCategory::Object(ref object)) => {
                let name = object.name.as_deref().map(str::trim).unwrap_or_default();
                if name.is_empty() {
                    object
                        .id
                        .as_deref()
                        .map_or_else(CategoryRef::uncategorized, |id| self.resolve_text(id))
                } else {
                    CategoryRef {
                        id: object.id.as_deref().map(CategoryId::from),
                        name: name.to_owned(),
                    }
                }
            }
            Some(&RawCategory::Other(serde_json::Value::Number(ref number))) => {
                self.resolve_text(&number.to_string())
            }
            Some(&RawCategory::Other(_)) | None => CategoryRef::uncategorized(),
        }
    }

    /// Resolves a bare string that may be an id or a name.
    fn resolve_text(&self, text: &str) -> CategoryRef {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return CategoryRef::uncategorized();
        }
        self.name_of(trimmed).map_or_else(
            || CategoryRef::named(trimmed),
            |name| CategoryRef {
                id: Some(CategoryId::from(trimmed)),
                name: name.to_owned(),
            },
        )
    }
}

/// Parses a backend date string into a calendar date.
///
/// Offset-carrying timestamps keep the date as written in their own
/// offset. Returns `None` for anything unrecognized and for years
/// outside `0..=9999`.
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    parse_any_date(text.trim()).filter(|&date| has_month_key_year(date))
}

/// Tries every accepted layout on an already trimmed string.
fn parse_any_date(trimmed: &str) -> Option<NaiveDate> {
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(stamp.date_naive());
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(stamp.date());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    trimmed.parse::<MonthKey>().ok().map(MonthKey::first_day)
}

/// Whether the date's month can be keyed as `YYYY-MM`.
fn has_month_key_year(date: NaiveDate) -> bool {
    MONTH_KEY_YEARS.contains(&date.year())
}

/// Converts Unix milliseconds into a UTC calendar date.
#[allow(
    clippy::cast_possible_truncation,
    reason = "non-finite values are rejected and out-of-range ones saturate, then fail the chrono range check"
)]
fn millis_to_date(millis: f64) -> Option<NaiveDate> {
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(millis.round() as i64)
        .map(|stamp| stamp.date_naive())
        .filter(|&date| has_month_key_year(date))
}

/// Normalizes a single raw record.
#[must_use]
pub fn normalize(raw: &RawTransaction, index: &CategoryIndex) -> Transaction {
    Transaction {
        id: raw.id.as_deref().map(TransactionId::from),
        amount: raw.amount.as_ref().map_or(0.0_f64, RawAmount::value),
        kind: TransactionKind::from_optional(raw.kind.as_deref()),
        date: raw.date.as_ref().and_then(RawDate::to_date),
        category: index.resolve(raw.category.as_ref()),
        description: raw.description.clone(),
    }
}

/// Normalizes a batch of raw records against the user's categories.
#[must_use]
pub fn normalize_all(raws: &[RawTransaction], categories: &[Category]) -> Vec<Transaction> {
    let index = CategoryIndex::new(categories);
    let transactions: Vec<Transaction> = raws.iter().map(|raw| normalize(raw, &index)).collect();
    let undated = transactions.iter().filter(|tx| tx.date.is_none()).count();
    tracing::debug!(
        total = transactions.len(),
        undated,
        "normalized transactions"
    );
    transactions
}

/// Parses a JSON array of backend transactions and normalizes it.
///
/// # Errors
///
/// Returns [`crate::error::BudgetPilotError::Serialization`] if the input
/// is not a JSON array of objects.
#[inline]
pub fn parse_transactions(json: &str, categories: &[Category]) -> Result<Vec<Transaction>> {
    let raws: Vec<RawTransaction> = serde_json::from_str(json)?;
    Ok(normalize_all(&raws, categories))
}
