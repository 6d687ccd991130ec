//! Error types for the budgetpilot library.

use crate::models::GoalId;

/// All errors that can occur when using budgetpilot.
///
/// The analytics functions are total and never produce these; errors
/// come from parsing, validation and the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum BudgetPilotError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage backend failed.
    #[error("storage error: {0}")]
    Storage(Box<dyn core::error::Error + Send + Sync>),

    /// A storage key contains characters that are not allowed.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// A month string is not in `YYYY-MM` form.
    #[error("invalid month {0:?}, expected YYYY-MM")]
    InvalidMonth(String),

    /// A value supplied by the caller was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No savings goal with the given identifier exists.
    #[error("savings goal not found: {0}")]
    GoalNotFound(GoalId),

    /// The planner was built without a storage backend.
    #[error("a storage backend is required")]
    MissingStorage,
}

/// Convenience alias for results in this crate.
pub type Result<T> = core::result::Result<T, BudgetPilotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_from_serde_json() {
        let serde_err = serde_json::from_str::<String>("not json").unwrap_err();
        let err = BudgetPilotError::from(serde_err);
        assert!(matches!(err, BudgetPilotError::Serialization(_)));
        assert!(err.to_string().contains("serialization error"));
    }

    #[test]
    fn error_storage_display() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = BudgetPilotError::Storage(Box::new(inner));
        let msg = err.to_string();
        assert!(msg.contains("storage error"));
        assert!(msg.contains("file missing"));
    }

    #[test]
    fn error_invalid_month_display() {
        let err = BudgetPilotError::InvalidMonth("2024-13".to_owned());
        assert_eq!(err.to_string(), r#"invalid month "2024-13", expected YYYY-MM"#);
    }

    #[test]
    fn error_goal_not_found_display() {
        let err = BudgetPilotError::GoalNotFound(GoalId::new("g_1".to_owned()));
        assert_eq!(err.to_string(), "savings goal not found: g_1");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BudgetPilotError>();
    }
}
