//! Statistical outlier filter: pooled per-month z-score test.

use ctn_core::reading::Reading;
use ctn_core::stats;

/// Observations with |z| at or above this limit are outliers.
pub const Z_SCORE_LIMIT: f64 = 3.0;

/// Keep mask for a pooled value set under the z-score test.
///
/// With fewer than two values, or zero spread, every z is undefined and
/// nothing is kept.
pub fn zscore_keep_mask(values: &[f64]) -> Vec<bool> {
    let moments = stats::mean(values).zip(stats::std_sample(values));
    let Some((mean, std)) = moments else {
        return vec![false; values.len()];
    };
    if std == 0.0 {
        return vec![false; values.len()];
    }
    values
        .iter()
        .map(|v| ((v - mean) / std).abs() < Z_SCORE_LIMIT)
        .collect()
}

/// Remove readings whose z-score relative to the pooled mean/std of the
/// whole input (all sensors together) is out of bounds. The input is
/// expected to span one calendar month.
pub fn remove_outliers(readings: &[Reading]) -> Vec<Reading> {
    let values: Vec<f64> = readings.iter().map(|r| r.temperature).collect();
    let mask = zscore_keep_mask(&values);
    let retained: Vec<Reading> = readings
        .iter()
        .zip(mask)
        .filter(|(_, keep)| *keep)
        .map(|(r, _)| r.clone())
        .collect();
    log::info!(
        "outlier filter: kept {} of {} readings",
        retained.len(),
        readings.len()
    );
    retained
}
