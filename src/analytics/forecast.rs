//! Next-month expense forecast from per-category history.

use alloc::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{count_as_f64, monthly_category_history};
use crate::models::Transaction;

/// Window of the weighted moving average used by [`forecast_next_month`].
pub const FORECAST_WINDOW: usize = 3;

/// Minimum months of history a category needs to be forecast.
const MIN_HISTORY: usize = 2;

/// Predicted expense per category for the month after the data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Category name → predicted expense.
    pub categories: BTreeMap<String, f64>,
    /// Sum of all predictions.
    pub total: f64,
}

/// Arithmetic mean; 0 for an empty slice.
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0_f64;
    }
    values.iter().sum::<f64>() / count_as_f64(values.len())
}

/// Weighted average of the last `window` values, the `i`-th weighted
/// `(i + 1) / window` so recent months count more.
///
/// With fewer than `window` values this is the plain mean.
#[must_use]
pub fn weighted_moving_average(values: &[f64], window: usize) -> f64 {
    if values.len() < window {
        return mean(values);
    }
    let recent = values
        .get(values.len().saturating_sub(window)..)
        .unwrap_or_default();
    let size = count_as_f64(recent.len());

    let mut weighted = 0.0_f64;
    let mut weight_sum = 0.0_f64;
    let mut rank = 0.0_f64;
    for value in recent {
        rank += 1.0_f64;
        let weight = rank / size;
        weighted += value * weight;
        weight_sum += weight;
    }

    if weight_sum > 0.0_f64 {
        weighted / weight_sum
    } else {
        0.0_f64
    }
}

/// Least-squares slope of `values` against their index.
///
/// Returns 0 for fewer than two values or a degenerate fit.
#[must_use]
pub fn linear_trend_slope(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0_f64;
    }
    let count = count_as_f64(values.len());
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);
    let mut x = 0.0_f64;
    for value in values {
        sum_x += x;
        sum_y += value;
        sum_xy += x * value;
        sum_x2 += x * x;
        x += 1.0_f64;
    }

    let slope = count.mul_add(sum_xy, -(sum_x * sum_y)) / count.mul_add(sum_x2, -(sum_x * sum_x));
    if slope.is_finite() { slope } else { 0.0_f64 }
}

/// Plain mean of the last `window` values; 0 for empty input or a zero
/// window.
#[must_use]
pub fn rolling_average(values: &[f64], window: usize) -> f64 {
    if window == 0 {
        return 0.0_f64;
    }
    mean(
        values
            .get(values.len().saturating_sub(window)..)
            .unwrap_or_default(),
    )
}

/// Forecasts next month's expense of every category with at least two
/// months of history.
///
/// Histories are month-aligned: a month without spending in a category
/// counts as 0 for it.
#[must_use]
pub fn forecast_next_month(transactions: &[Transaction]) -> Forecast {
    let categories: BTreeMap<String, f64> = monthly_category_history(transactions)
        .into_iter()
        .filter(|(_, history)| history.len() >= MIN_HISTORY)
        .map(|(category, history)| {
            let predicted = weighted_moving_average(&history, FORECAST_WINDOW);
            (category, predicted)
        })
        .collect();
    let total = categories.values().sum();
    Forecast { categories, total }
}
