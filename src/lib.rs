//! Personal finance analytics for the `BudgetPilot` budgeting app.
//!
//! Raw backend transactions are normalized once by [`ingest`] and then
//! summarized by the pure functions in [`analytics`]: lifetime totals,
//! category breakdowns, monthly and per-category trends, headline
//! insights, forecasts, anomaly alerts and saving tips. [`planner`] keeps
//! monthly budgets and savings goals in a pluggable [`storage`] backend,
//! and [`backup`] reads and writes JSON snapshots.

extern crate alloc;

pub mod analytics;
pub mod backup;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod models;
pub mod planner;
pub mod storage;
