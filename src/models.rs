//! Data models for budgeting entities.
//!
//! This module contains strongly-typed representations of transactions,
//! categories, budgets and savings goals, newtype ID wrappers, the
//! [`MonthKey`] bucket type, and enumeration types for constrained
//! values.

mod budget;
mod category;
mod enums;
mod goal;
mod ids;
mod month;
mod transaction;

pub use budget::MonthlyBudgets;
pub use category::{
    Category, DEFAULT_EXPENSE_CATEGORIES, DEFAULT_INCOME_CATEGORIES, merge_with_defaults,
};
pub(crate) use enums::deserialize_lenient;
pub use enums::{AlertKind, TransactionKind};
pub use goal::SavingsGoal;
pub use ids::{CategoryId, GoalId, TransactionId};
pub use month::MonthKey;
pub use transaction::{CategoryRef, Transaction, UNCATEGORIZED};

pub use chrono::NaiveDate;
