//! In-memory storage backend.
//!
//! Provides [`InMemoryStorage`], a thread-safe map of JSON documents.
//! Ideal for unit tests and for embedding the planner where nothing
//! should touch the disk.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use super::{Storage, lock_poison_error, validate_key};
use crate::error::Result;

/// Thread-safe in-memory storage.
///
/// Keys are validated exactly like [`super::FileStorage`] does, so code
/// tested against this backend behaves the same on disk.
///
/// # Example
///
/// ```rust
/// use budgetpilot::storage::{InMemoryStorage, Storage};
///
/// let storage = InMemoryStorage::new();
/// storage.write("budgets_v1", &serde_json::json!({})).unwrap();
/// assert!(storage.read("budgets_v1").unwrap().is_some());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    /// Documents behind a mutex for thread-safe interior mutability.
    inner: Mutex<HashMap<String, Value>>,
}

impl InMemoryStorage {
    /// Creates an empty storage.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for InMemoryStorage {
    #[inline]
    fn read(&self, key: &str) -> Result<Option<Value>> {
        validate_key(key)?;
        let documents = self.inner.lock().map_err(|err| lock_poison_error(&err))?;
        Ok(documents.get(key).cloned())
    }

    #[inline]
    fn write(&self, key: &str, value: &Value) -> Result<()> {
        validate_key(key)?;
        let mut documents = self.inner.lock().map_err(|err| lock_poison_error(&err))?;
        drop(documents.insert(key.to_owned(), value.clone()));
        Ok(())
    }

    #[inline]
    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let mut documents = self.inner.lock().map_err(|err| lock_poison_error(&err))?;
        drop(documents.remove(key));
        Ok(())
    }
}
