//! Bias filter: drop individual readings outside the reference network's
//! per-hour confidence band.

use crate::audit::{SensorRemoval, StageRemovals};
use ctn_core::reading::Reading;
use ctn_core::reference::ReferenceSeries;

/// Half-width of the confidence band in reference standard deviations.
pub const BAND_SIGMA: f64 = 3.0;

/// For every reading, look up the aligned reference bucket for its hour
/// label; drop the reading when it falls outside `mean ± 3·std`. A reading
/// with no matching bucket, or a bucket with undefined statistics, cannot
/// be judged and is retained.
pub fn remove_biased(
    readings: &[Reading],
    reference: &ReferenceSeries,
    year: i32,
) -> (Vec<Reading>, StageRemovals, Vec<SensorRemoval>) {
    let aligned = reference.aligned();
    let mut retained = Vec::new();
    let mut sensor_stats = Vec::new();
    for module_id in Reading::module_ids(readings) {
        // every row is judged on its own; timestamp dedup belongs to the
        // irregularity stage
        let series = Reading::sensor_series(readings, &module_id);
        let initial = series.len();
        let (lat, long) = series
            .first()
            .map(|r| (r.lat, r.long))
            .unwrap_or((f64::NAN, f64::NAN));

        let unbiased: Vec<Reading> = series
            .into_iter()
            .filter(|reading| {
                let Some(stat) = aligned.at(reading.time) else {
                    return true;
                };
                let judged = stat.mean.zip(stat.std);
                let Some((mean, std)) = judged else {
                    return true;
                };
                let lower = mean - BAND_SIGMA * std;
                let upper = mean + BAND_SIGMA * std;
                reading.temperature >= lower && reading.temperature <= upper
            })
            .collect();
        sensor_stats.push(SensorRemoval::new(
            module_id,
            lat,
            long,
            year,
            initial,
            unbiased.len(),
        ));
        retained.extend(unbiased);
    }
    let removals = StageRemovals::new(readings.len(), retained.len());
    log::info!(
        "bias filter: kept {} of {} readings",
        retained.len(),
        readings.len()
    );
    (retained, removals, sensor_stats)
}
