//! JSON backups of a user's data and loading of analysis input.
//!
//! A [`Backup`] bundles the profile, categories and raw transactions
//! under a creation timestamp. [`Dataset`] is what the analytics consume:
//! it accepts either a backup or a bare transaction array.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BudgetPilotError, Result};
use crate::ingest::{RawTransaction, normalize_all};
use crate::models::{Category, Transaction};

/// Prefix of backup file names.
const FILE_PREFIX: &str = "budgetpilot_backup_";

/// Snapshot of a user's data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Profile document, kept opaque.
    #[serde(default = "empty_object")]
    pub profile: Value,
    /// User categories.
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Transactions exactly as the backend returned them.
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
}

/// Serde default for [`Backup::profile`].
fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl Backup {
    /// Creates a backup with an empty profile.
    #[inline]
    #[must_use]
    pub fn new(
        timestamp: DateTime<Utc>,
        categories: Vec<Category>,
        transactions: Vec<RawTransaction>,
    ) -> Self {
        Self {
            timestamp,
            profile: empty_object(),
            categories,
            transactions,
        }
    }

    /// Replaces the profile document.
    #[inline]
    #[must_use]
    pub fn with_profile(mut self, profile: Value) -> Self {
        self.profile = profile;
        self
    }

    /// Serializes the backup as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetPilotError::Serialization`] if serialization fails.
    #[inline]
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a backup document.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetPilotError::Serialization`] if the input is not a
    /// backup object.
    #[inline]
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads either a backup object or a bare array of backend
    /// transactions. An array becomes a backup taken at `timestamp` with
    /// no categories and an empty profile.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetPilotError::Serialization`] if the input is not
    /// valid JSON of either shape, or [`BudgetPilotError::InvalidInput`]
    /// if it is neither an object nor an array.
    pub fn from_input_json(json: &str, timestamp: DateTime<Utc>) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        match value {
            Value::Array(_) => {
                let raws: Vec<RawTransaction> = serde_json::from_value(value)?;
                Ok(Self::new(timestamp, Vec::new(), raws))
            }
            Value::Object(_) => Ok(serde_json::from_value(value)?),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                Err(BudgetPilotError::InvalidInput(
                    "expected a backup object or a transaction array".to_owned(),
                ))
            }
        }
    }

    /// Suggested file name, e.g. `budgetpilot_backup_2024-03-01T09-30-00.json`.
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "{FILE_PREFIX}{}.json",
            self.timestamp.format("%Y-%m-%dT%H-%M-%S")
        )
    }

    /// The transactions, normalized against the backup's categories.
    #[inline]
    #[must_use]
    pub fn normalized_transactions(&self) -> Vec<Transaction> {
        normalize_all(&self.transactions, &self.categories)
    }
}

/// Normalized input for the analytics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// User categories (empty when the input had none).
    pub categories: Vec<Category>,
    /// Normalized transactions.
    pub transactions: Vec<Transaction>,
}

impl Dataset {
    /// Loads a backup object or a bare array of backend transactions.
    ///
    /// # Errors
    ///
    /// Same as [`Backup::from_input_json`].
    #[inline]
    pub fn from_json(json: &str) -> Result<Self> {
        let backup = Backup::from_input_json(json, DateTime::<Utc>::default())?;
        Ok(Self::from(&backup))
    }
}

impl From<&Backup> for Dataset {
    #[inline]
    fn from(backup: &Backup) -> Self {
        Self {
            categories: backup.categories.clone(),
            transactions: backup.normalized_transactions(),
        }
    }
}
