//! Pluggable key/value storage for planner state.
//!
//! Values are JSON documents addressed by a short key (for example
//! `budgets_v1`). [`InMemoryStorage`] keeps them in a map;
//! [`FileStorage`] (feature `storage-file`) writes one file per key.

#[cfg(feature = "storage-file")]
mod file;
mod memory;

#[cfg(feature = "storage-file")]
pub use file::FileStorage;
pub use memory::InMemoryStorage;

use serde_json::Value;

use crate::error::{BudgetPilotError, Result};

/// Storage backend for JSON documents addressed by key.
///
/// All methods take `&self`; implementations use interior mutability
/// (e.g. `Mutex`) for thread-safe mutation.
pub trait Storage: core::fmt::Debug + Send + Sync {
    /// Returns the document stored under `key`, or `Ok(None)` if there is
    /// none.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the backend fails to
    /// read.
    fn read(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous document.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the backend fails to
    /// write.
    fn write(&self, key: &str, value: &Value) -> Result<()>;

    /// Removes the document stored under `key`. Removing a missing key is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the backend fails to
    /// write.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Checks that `key` is non-empty, made of ASCII alphanumerics, `_`, `-`
/// and `.`, and does not start with `.`.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    let allowed = |ch: char| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.');
    if key.is_empty() || key.starts_with('.') || !key.chars().all(allowed) {
        return Err(BudgetPilotError::InvalidKey(key.to_owned()));
    }
    Ok(())
}

/// Wraps a mutex poison error into a [`BudgetPilotError::Storage`].
fn lock_poison_error<T>(err: &std::sync::PoisonError<T>) -> BudgetPilotError {
    BudgetPilotError::Storage(err.to_string().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_keys() {
        for key in ["budgets_v1", "savings_goals_v1", "a", "profile-2", "x.y"] {
            assert!(validate_key(key).is_ok(), "{key}");
        }
    }

    #[test]
    fn rejects_unsafe_keys() {
        for key in ["", ".hidden", "../etc", "a/b", "a b", "ключ", "a\\b"] {
            let err = validate_key(key).unwrap_err();
            assert!(matches!(err, BudgetPilotError::InvalidKey(_)), "{key}");
        }
    }
}
