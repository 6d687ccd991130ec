//! Spending spike detection over per-category month series.
//!
//! Both detectors look at the *last* value of each series and compare it
//! with the whole series, so the input should be chronological (as
//! produced by [`super::monthly_category_history`]).

use alloc::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::count_as_f64;
use crate::models::AlertKind;

/// Absolute z-score above which the last value is flagged.
pub const ZSCORE_THRESHOLD: f64 = 2.0;

/// Absolute modified z-score above which the last value is flagged.
pub const MAD_THRESHOLD: f64 = 3.5;

/// Scales MAD to be comparable with a standard deviation.
const MAD_SCALE: f64 = 0.6745;

/// An unusual month for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// What was detected.
    pub kind: AlertKind,
    /// Category name.
    pub category: String,
    /// The flagged (latest) value.
    pub value: f64,
    /// Mean or median the value was compared against.
    pub baseline: f64,
    /// The z-score or modified z-score.
    pub score: f64,
    /// Human-readable description.
    pub message: String,
}

/// Median of `values`; `None` for an empty slice.
fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len().div_euclid(2);
    if sorted.len().rem_euclid(2) == 0 {
        let lower = sorted.get(mid.checked_sub(1)?)?;
        let upper = sorted.get(mid)?;
        Some((lower + upper) / 2.0_f64)
    } else {
        sorted.get(mid).copied()
    }
}

/// Population mean and standard deviation of a non-empty slice.
fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
    let count = count_as_f64(values.len());
    let mean = values.iter().sum::<f64>() / count;
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / count;
    (mean, variance.sqrt())
}

/// Flags categories whose last value lies more than
/// [`ZSCORE_THRESHOLD`] standard deviations from the series mean.
///
/// Series with fewer than two values are skipped; a flat series has a
/// z-score of 0.
#[must_use]
pub fn detect_anomalies_zscore(history: &BTreeMap<String, Vec<f64>>) -> Vec<Alert> {
    history
        .iter()
        .filter(|&(_, values)| values.len() >= 2)
        .filter_map(|(category, values)| {
            let last = *values.last()?;
            let (mean, std_dev) = mean_and_std_dev(values);
            let score = if std_dev > 0.0_f64 {
                (last - mean) / std_dev
            } else {
                0.0_f64
            };
            (score.abs() > ZSCORE_THRESHOLD).then(|| Alert {
                kind: AlertKind::SpendingSpike,
                category: category.clone(),
                value: last,
                baseline: mean,
                score,
                message: format!(
                    "Unusual {category} spending detected: {last:.2} (avg: {mean:.2}, z-score: {score:.2})"
                ),
            })
        })
        .collect()
}

/// Flags categories whose last value has a modified z-score
/// (`0.6745 × (last − median) / MAD`) above [`MAD_THRESHOLD`].
///
/// Series with fewer than three values are skipped, and so are series
/// whose MAD is 0.
#[must_use]
pub fn detect_anomalies_mad(history: &BTreeMap<String, Vec<f64>>) -> Vec<Alert> {
    history
        .iter()
        .filter(|&(_, values)| values.len() >= 3)
        .filter_map(|(category, values)| {
            let last = *values.last()?;
            let center = median(values)?;
            let deviations: Vec<f64> = values.iter().map(|value| (value - center).abs()).collect();
            let mad = median(&deviations)?;
            if mad <= 0.0_f64 {
                return None;
            }
            let score = MAD_SCALE * (last - center) / mad;
            (score.abs() > MAD_THRESHOLD).then(|| Alert {
                kind: AlertKind::SpendingSpike,
                category: category.clone(),
                value: last,
                baseline: center,
                score,
                message: format!(
                    "Outlier {category} spending detected: {last:.2} (median: {center:.2}, MAD: {mad:.2})"
                ),
            })
        })
        .collect()
}
