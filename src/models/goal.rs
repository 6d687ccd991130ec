//! Savings goal model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GoalId;

/// A named savings target with the amount saved so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    /// Unique identifier.
    pub id: GoalId,
    /// Display name.
    pub name: String,
    /// Amount to reach.
    pub target: f64,
    /// Amount saved so far.
    #[serde(default)]
    pub saved: f64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl SavingsGoal {
    /// Creates a goal whose id is derived from its creation time
    /// (`g_<unix millis>`).
    #[inline]
    #[must_use]
    pub fn new<N: Into<String>>(name: N, target: f64, saved: f64, created_at: DateTime<Utc>) -> Self {
        Self {
            id: GoalId::new(format!("g_{}", created_at.timestamp_millis())),
            name: name.into(),
            target,
            saved,
            created_at,
        }
    }

    /// Whole-number completion percentage, capped at 100.
    ///
    /// A goal without a positive target reports 0.
    #[inline]
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        if self.target > 0.0_f64 {
            (self.saved / self.target * 100.0_f64).round().min(100.0_f64)
        } else {
            0.0_f64
        }
    }

    /// Amount still missing to reach the target (never negative).
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> f64 {
        (self.target - self.saved).max(0.0_f64)
    }
}
