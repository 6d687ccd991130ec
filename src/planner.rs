//! Monthly budgets and savings goals persisted through a [`Storage`]
//! backend.
//!
//! [`BudgetPlanner`] owns the storage and exposes typed operations on the
//! two documents it keeps: the budget table and the goal list.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{BudgetPilotError, Result};
use crate::models::{
    Category, CategoryId, GoalId, MonthKey, MonthlyBudgets, SavingsGoal, Transaction,
    TransactionKind, merge_with_defaults,
};
use crate::storage::Storage;

/// Storage key of the budget table.
pub const BUDGETS_KEY: &str = "budgets_v1";

/// Storage key of the savings goal list.
pub const GOALS_KEY: &str = "savings_goals_v1";

/// Percent of budget from which a line is shown as a warning.
pub const NEAR_LIMIT_PERCENT: f64 = 80.0;

/// Budget versus actual spend of one expense category in a month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLine {
    /// Category id (the name for built-in defaults).
    pub category_id: CategoryId,
    /// Category display name.
    pub name: String,
    /// Budgeted amount; 0 when none was set.
    pub budget: f64,
    /// Expenses of the month in this category.
    pub spent: f64,
    /// `budget − spent`; negative when over budget.
    pub remaining: f64,
    /// Spent share of the budget, rounded and clamped to `0..=100`; 0
    /// without a budget.
    pub percent: f64,
    /// `true` when a budget is set and spending exceeds it.
    pub over_budget: bool,
}

impl BudgetLine {
    /// Returns `true` once spending passes [`NEAR_LIMIT_PERCENT`] of the
    /// budget.
    #[inline]
    #[must_use]
    pub fn is_near_limit(&self) -> bool {
        self.percent > NEAR_LIMIT_PERCENT
    }
}

/// Builder for [`BudgetPlanner`].
#[derive(Debug)]
pub struct BudgetPlannerBuilder<S: Storage> {
    /// Storage backend.
    storage: Option<S>,
}

impl<S: Storage> BudgetPlannerBuilder<S> {
    /// Sets the storage backend.
    #[inline]
    #[must_use]
    pub fn storage(mut self, storage: S) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Builds the planner.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetPilotError::MissingStorage`] if no storage was
    /// provided.
    #[inline]
    pub fn build(self) -> Result<BudgetPlanner<S>> {
        let storage = self.storage.ok_or(BudgetPilotError::MissingStorage)?;
        Ok(BudgetPlanner { storage })
    }
}

/// Budget and savings goal planner over a storage backend.
///
/// # Example
///
/// ```rust
/// use budgetpilot::models::MonthKey;
/// use budgetpilot::planner::BudgetPlanner;
/// use budgetpilot::storage::InMemoryStorage;
///
/// let planner = BudgetPlanner::builder()
///     .storage(InMemoryStorage::new())
///     .build()
///     .unwrap();
/// let month: MonthKey = "2024-03".parse().unwrap();
/// planner.set_budget(month, "Food", 300.0).unwrap();
/// assert_eq!(planner.budget_for(month, "Food").unwrap(), 300.0);
/// ```
#[derive(Debug)]
pub struct BudgetPlanner<S: Storage> {
    /// Storage backend.
    storage: S,
}

impl<S: Storage> BudgetPlanner<S> {
    /// Creates a new builder for configuring the planner.
    #[inline]
    #[must_use]
    pub const fn builder() -> BudgetPlannerBuilder<S> {
        BudgetPlannerBuilder { storage: None }
    }

    /// The underlying storage backend.
    #[inline]
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Reads and decodes a stored document.
    ///
    /// A missing document is the default value. So is a document that
    /// cannot be decoded; that case is logged and the stored data is left
    /// untouched until the next write replaces it.
    fn load<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        let value = match self.storage.read(key) {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(T::default()),
            Err(BudgetPilotError::Serialization(err)) => {
                tracing::warn!(key, error = %err, "discarding unreadable stored data");
                return Ok(T::default());
            }
            Err(err) => return Err(err),
        };
        match serde_json::from_value(value) {
            Ok(decoded) => Ok(decoded),
            Err(err) => {
                tracing::warn!(key, error = %err, "discarding unreadable stored data");
                Ok(T::default())
            }
        }
    }

    /// Encodes and stores a document.
    fn store<T: Serialize>(&self, key: &str, document: &T) -> Result<()> {
        let value = serde_json::to_value(document)?;
        self.storage.write(key, &value)
    }

    // ── Budgets ─────────────────────────────────────────────────────

    /// Returns the full budget table.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to read.
    #[inline]
    pub fn budgets(&self) -> Result<MonthlyBudgets> {
        self.load(BUDGETS_KEY)
    }

    /// Budget for a category key in a month; 0 when none was set.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to read.
    #[inline]
    pub fn budget_for(&self, month: MonthKey, category_key: &str) -> Result<f64> {
        Ok(self.budgets()?.amount_for(month, category_key))
    }

    /// Sets the budget for a category key in a month.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetPilotError::InvalidInput`] if `amount` is negative
    /// or not finite, or an error if the storage backend fails.
    #[tracing::instrument(skip_all)]
    pub fn set_budget(&self, month: MonthKey, category_key: &str, amount: f64) -> Result<()> {
        if !amount.is_finite() || amount < 0.0_f64 {
            return Err(BudgetPilotError::InvalidInput(format!(
                "budget must be a non-negative number, got {amount}"
            )));
        }
        let mut budgets = self.budgets()?;
        budgets.set(month, category_key.to_owned(), amount);
        self.store(BUDGETS_KEY, &budgets)?;
        tracing::debug!(%month, category = category_key, amount, "budget updated");
        Ok(())
    }

    /// Sets a budget given a category id or name.
    ///
    /// The reference is resolved with [`resolve_budget_key`] against the
    /// user's categories so the amount lands under the key that
    /// [`Self::budget_report`] reads. Returns that key.
    ///
    /// # Errors
    ///
    /// Same as [`Self::set_budget`].
    #[inline]
    pub fn set_category_budget(
        &self,
        month: MonthKey,
        categories: &[Category],
        reference: &str,
        amount: f64,
    ) -> Result<String> {
        let key = resolve_budget_key(categories, reference);
        self.set_budget(month, &key, amount)?;
        Ok(key)
    }

    /// Budget versus spend for every expense category in `month`.
    ///
    /// Lines follow [`merge_with_defaults`] order over the user's expense
    /// categories. Spend is matched by category id, or by name for
    /// transactions whose category had no id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to read.
    #[tracing::instrument(skip_all)]
    pub fn budget_report(
        &self,
        month: MonthKey,
        categories: &[Category],
        transactions: &[Transaction],
    ) -> Result<Vec<BudgetLine>> {
        let budgets = self.budgets()?;
        let month_expenses: Vec<&Transaction> = transactions
            .iter()
            .filter(|tx| !tx.is_income() && tx.month() == Some(month))
            .collect();

        let lines = merge_with_defaults(categories, Some(TransactionKind::Expense))
            .into_iter()
            .map(|category| {
                let key = category.id.as_inner();
                let budget = budgets.amount_for(month, key);
                let spent: f64 = month_expenses
                    .iter()
                    .filter(|tx| tx.category.budget_key() == key)
                    .map(|tx| tx.amount)
                    .sum();
                let percent = if budget > 0.0_f64 {
                    (spent / budget * 100.0_f64).round().clamp(0.0_f64, 100.0_f64)
                } else {
                    0.0_f64
                };
                BudgetLine {
                    budget,
                    spent,
                    remaining: budget - spent,
                    percent,
                    over_budget: budget > 0.0_f64 && spent > budget,
                    name: category.name,
                    category_id: category.id,
                }
            })
            .collect();
        Ok(lines)
    }

    // ── Savings goals ───────────────────────────────────────────────

    /// Returns all savings goals, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to read.
    #[inline]
    pub fn goals(&self) -> Result<Vec<SavingsGoal>> {
        self.load(GOALS_KEY)
    }

    /// Looks up a goal by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to read.
    #[inline]
    pub fn goal(&self, id: &GoalId) -> Result<Option<SavingsGoal>> {
        Ok(self.goals()?.into_iter().find(|goal| goal.id == *id))
    }

    /// Adds a goal in front of the existing ones.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetPilotError::InvalidInput`] if the goal has an empty
    /// name, a non-positive target, a negative saved amount, or an id that
    /// is already taken; or an error if the storage backend fails.
    #[tracing::instrument(skip_all)]
    pub fn add_goal(&self, goal: SavingsGoal) -> Result<()> {
        validate_goal(&goal)?;
        let mut goals = self.goals()?;
        if goals.iter().any(|existing| existing.id == goal.id) {
            return Err(BudgetPilotError::InvalidInput(format!(
                "a savings goal with id {} already exists",
                goal.id
            )));
        }
        tracing::debug!(id = %goal.id, name = %goal.name, "adding savings goal");
        goals.insert(0, goal);
        self.store(GOALS_KEY, &goals)
    }

    /// Replaces the goal with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetPilotError::GoalNotFound`] if no goal has that id,
    /// [`BudgetPilotError::InvalidInput`] if the goal is invalid, or an
    /// error if the storage backend fails.
    #[tracing::instrument(skip_all)]
    pub fn update_goal(&self, goal: SavingsGoal) -> Result<()> {
        validate_goal(&goal)?;
        let mut goals = self.goals()?;
        let slot = goals
            .iter_mut()
            .find(|existing| existing.id == goal.id)
            .ok_or_else(|| BudgetPilotError::GoalNotFound(goal.id.clone()))?;
        tracing::debug!(id = %goal.id, "updating savings goal");
        *slot = goal;
        self.store(GOALS_KEY, &goals)
    }

    /// Sets the saved amount of a goal and returns the updated goal.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetPilotError::GoalNotFound`] if no goal has that id,
    /// [`BudgetPilotError::InvalidInput`] if `saved` is negative or not
    /// finite, or an error if the storage backend fails.
    #[tracing::instrument(skip_all)]
    pub fn set_goal_saved(&self, id: &GoalId, saved: f64) -> Result<SavingsGoal> {
        let mut goal = self
            .goal(id)?
            .ok_or_else(|| BudgetPilotError::GoalNotFound(id.clone()))?;
        goal.saved = saved;
        self.update_goal(goal.clone())?;
        Ok(goal)
    }

    /// Deletes a goal.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetPilotError::GoalNotFound`] if no goal has that id,
    /// or an error if the storage backend fails.
    #[tracing::instrument(skip_all)]
    pub fn delete_goal(&self, id: &GoalId) -> Result<()> {
        let mut goals = self.goals()?;
        let before = goals.len();
        goals.retain(|goal| goal.id != *id);
        if goals.len() == before {
            return Err(BudgetPilotError::GoalNotFound(id.clone()));
        }
        tracing::debug!(%id, "deleted savings goal");
        self.store(GOALS_KEY, &goals)
    }
}

/// Maps a category id or name to the budget key of that expense category.
///
/// An exact id match wins, then a case-insensitive name match among the
/// user's expense categories merged with the defaults. Anything else is
/// returned trimmed, unchanged.
#[must_use]
pub fn resolve_budget_key(categories: &[Category], reference: &str) -> String {
    let wanted = reference.trim();
    let expense = merge_with_defaults(categories, Some(TransactionKind::Expense));
    expense
        .iter()
        .find(|category| category.id.as_inner() == wanted)
        .or_else(|| {
            expense
                .iter()
                .find(|category| category.name.eq_ignore_ascii_case(wanted))
        })
        .map_or_else(|| wanted.to_owned(), |category| category.id.as_inner().to_owned())
}

/// Checks the user-editable fields of a goal.
fn validate_goal(goal: &SavingsGoal) -> Result<()> {
    if goal.name.trim().is_empty() {
        return Err(BudgetPilotError::InvalidInput(
            "goal name must not be empty".to_owned(),
        ));
    }
    if !goal.target.is_finite() || goal.target <= 0.0_f64 {
        return Err(BudgetPilotError::InvalidInput(format!(
            "goal target must be a positive number, got {}",
            goal.target
        )));
    }
    if !goal.saved.is_finite() || goal.saved < 0.0_f64 {
        return Err(BudgetPilotError::InvalidInput(format!(
            "saved amount must be a non-negative number, got {}",
            goal.saved
        )));
    }
    Ok(())
}
