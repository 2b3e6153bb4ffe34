//! Correlation filter: discard sensors whose hourly series does not track
//! the virtual reference signal.

use crate::audit::{CorrelationRecord, StageRemovals};
use ctn_core::reading::Reading;
use ctn_core::reference::ReferenceSeries;
use ctn_core::stats;
use std::collections::HashSet;

/// Minimum Pearson coefficient for a sensor to survive.
pub const DEFAULT_CORRELATION_THRESHOLD: f64 = 0.6;

/// Pearson coefficient per sensor over the time-aligned intersection of
/// the sensor's series and the reference mean series (inner join on exact
/// hour labels, after the half-hour network alignment).
pub fn compute_correlations(
    readings: &[Reading],
    reference: &ReferenceSeries,
    year: i32,
) -> Vec<CorrelationRecord> {
    let aligned = reference.aligned();
    let mut records = Vec::new();
    for module_id in Reading::module_ids(readings) {
        let mut series = Reading::sensor_series(readings, &module_id);
        series.sort();
        series.dedup_by(|a, b| a.time == b.time);

        let mut sensor_values = Vec::new();
        let mut reference_values = Vec::new();
        for reading in &series {
            if let Some(stat) = aligned.at(reading.time) {
                if let Some(mean) = stat.mean {
                    sensor_values.push(reading.temperature);
                    reference_values.push(mean);
                }
            }
        }
        let (lat, long) = series
            .first()
            .map(|r| (r.lat, r.long))
            .unwrap_or((f64::NAN, f64::NAN));
        records.push(CorrelationRecord {
            module_id,
            lat,
            long,
            year,
            pearson: stats::pearson(&sensor_values, &reference_values),
        });
    }
    records
}

/// Retain readings of sensors whose coefficient is defined and at or
/// above the threshold. Sensors with an undefined coefficient (no overlap
/// with the reference, or zero variance) are excluded, never defaulted.
pub fn remove_low_correlation(
    readings: &[Reading],
    records: &[CorrelationRecord],
    threshold: f64,
) -> (Vec<Reading>, StageRemovals) {
    let surviving: HashSet<&str> = records
        .iter()
        .filter(|r| r.pearson.is_some_and(|p| p >= threshold))
        .map(|r| r.module_id.as_str())
        .collect();
    let retained: Vec<Reading> = readings
        .iter()
        .filter(|r| surviving.contains(r.module_id.as_str()))
        .cloned()
        .collect();
    let removals = StageRemovals::new(readings.len(), retained.len());
    log::info!(
        "correlation filter: {} of {} sensors at or above {threshold}, kept {} of {} readings",
        surviving.len(),
        records.len(),
        retained.len(),
        readings.len()
    );
    (retained, removals)
}
