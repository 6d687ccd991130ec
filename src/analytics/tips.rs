//! Rule-based saving tips.

use alloc::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::percent_of;
use crate::models::Transaction;

/// Generic advice is appended while a report has fewer tips than this.
const MIN_TIPS: usize = 4;

/// A report never carries more than this many tips.
const MAX_TIPS: usize = 6;

/// A saving recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tip {
    /// Food above 30 % of expenses.
    FoodSpending,
    /// Entertainment above 20 % of expenses.
    EntertainmentSpending,
    /// Transport above 15 % of expenses.
    TransportSpending,
    /// Saving rate below 10 %.
    LowSavingRate,
    /// Utilities above 10 % of expenses.
    UtilitiesSpending,
    /// Shopping above 20 % of expenses.
    ShoppingSpending,
    /// Saving rate of 20 % or more.
    GreatSavingRate,
    /// Filler: keep tracking expenses.
    TrackExpenses,
    /// Filler: build an emergency fund.
    EmergencyFund,
}

impl Tip {
    /// The advice shown to the user.
    #[inline]
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::FoodSpending => {
                "Food spending is above 30% of your budget. Consider meal planning and batch cooking to reduce this category."
            }
            Self::EntertainmentSpending => {
                "Entertainment expenses are 20%+ of your budget. Try setting a monthly entertainment cap."
            }
            Self::TransportSpending => {
                "Transportation is taking up over 15% of your budget. Explore carpooling or public transit options."
            }
            Self::LowSavingRate => {
                "Your savings rate is below 10%. Try cutting discretionary spending to improve financial security."
            }
            Self::UtilitiesSpending => {
                "Utilities are over 10%. Audit your subscriptions and energy usage for quick savings."
            }
            Self::ShoppingSpending => {
                "Shopping expenses are significant. Consider a 48-hour rule before non-essential purchases."
            }
            Self::GreatSavingRate => {
                "Great job! Your saving rate is 20%+. Keep up the excellent financial discipline!"
            }
            Self::TrackExpenses => {
                "Track your expenses regularly to identify spending patterns and opportunities."
            }
            Self::EmergencyFund => "Build an emergency fund equal to 3-6 months of living expenses.",
        }
    }
}

impl core::fmt::Display for Tip {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// Spending figures the tip rules are evaluated on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingAnalysis {
    /// Sum of income.
    pub total_income: f64,
    /// Sum of expenses.
    pub total_expense: f64,
    /// `(income − expense) / income × 100`; 0 without income.
    pub saving_rate: f64,
    /// Lowercase category name → expense.
    pub categories: BTreeMap<String, f64>,
    /// Lowercase category name → share of expense in percent.
    pub category_percentages: BTreeMap<String, f64>,
    /// Number of analysed transactions.
    pub transaction_count: usize,
}

impl SpendingAnalysis {
    /// Builds the analysis from normalized transactions.
    #[must_use]
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut analysis = Self {
            transaction_count: transactions.len(),
            ..Self::default()
        };
        for tx in transactions {
            if tx.is_income() {
                analysis.total_income += tx.amount;
            } else {
                analysis.total_expense += tx.amount;
                *analysis
                    .categories
                    .entry(tx.category.name.to_lowercase())
                    .or_insert(0.0_f64) += tx.amount;
            }
        }

        if analysis.total_expense > 0.0_f64 {
            analysis.category_percentages = analysis
                .categories
                .iter()
                .map(|(name, &total)| (name.clone(), percent_of(total, analysis.total_expense)))
                .collect();
        }
        if analysis.total_income > 0.0_f64 {
            analysis.saving_rate =
                (analysis.total_income - analysis.total_expense) / analysis.total_income * 100.0_f64;
        }
        analysis
    }

    /// Share of `category` (lowercase) in percent, 0 when absent.
    #[inline]
    #[must_use]
    pub fn percent(&self, category: &str) -> f64 {
        self.category_percentages
            .get(category)
            .copied()
            .unwrap_or(0.0_f64)
    }
}

/// Tips plus the figures they were derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipReport {
    /// Rule hits first, then generic advice; at most six.
    pub tips: Vec<Tip>,
    /// The underlying figures.
    pub analysis: SpendingAnalysis,
}

/// Evaluates the tip rules in order and pads the result with generic
/// advice up to four tips.
#[must_use]
pub fn recommend_tips(transactions: &[Transaction]) -> TipReport {
    let analysis = SpendingAnalysis::from_transactions(transactions);
    let rate = analysis.saving_rate;

    let rules = [
        (analysis.percent("food") > 30.0_f64, Tip::FoodSpending),
        (analysis.percent("entertainment") > 20.0_f64, Tip::EntertainmentSpending),
        (analysis.percent("transport") > 15.0_f64, Tip::TransportSpending),
        (rate < 10.0_f64, Tip::LowSavingRate),
        (analysis.percent("utilities") > 10.0_f64, Tip::UtilitiesSpending),
        (analysis.percent("shopping") > 20.0_f64, Tip::ShoppingSpending),
        (rate >= 20.0_f64, Tip::GreatSavingRate),
    ];
    let mut tips: Vec<Tip> = rules
        .into_iter()
        .filter_map(|(hit, tip)| hit.then_some(tip))
        .collect();

    for filler in [Tip::TrackExpenses, Tip::EmergencyFund] {
        if tips.len() < MIN_TIPS {
            tips.push(filler);
        }
    }
    tips.truncate(MAX_TIPS);

    TipReport { tips, analysis }
}
