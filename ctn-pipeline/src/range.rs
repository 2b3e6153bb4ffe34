//! Range filter: drop readings outside the reference network's observed
//! temperature envelope.

use crate::audit::SensorRemoval;
use ctn_core::reading::Reading;
use ctn_core::reference::ReferenceSeries;

/// Margin added to the reference envelope for legitimate local
/// fluctuations (urban heat island and the like).
pub const ENVELOPE_MARGIN: f64 = 2.0;

/// Retain readings strictly inside `[reference min - 2, reference max + 2]`,
/// sensor by sensor, recording per-sensor removal statistics.
///
/// When the reference series has no defined extremes at all, nothing can
/// be judged and every reading is retained.
pub fn remove_unrealistic(
    readings: &[Reading],
    reference: &ReferenceSeries,
    year: i32,
) -> (Vec<Reading>, Vec<SensorRemoval>) {
    let extremes = reference.min_temperature().zip(reference.max_temperature());
    let Some((ref_min, ref_max)) = extremes else {
        log::warn!("range filter: reference envelope undefined, retaining all readings");
        return (readings.to_vec(), Vec::new());
    };
    let minimum = ref_min - ENVELOPE_MARGIN;
    let maximum = ref_max + ENVELOPE_MARGIN;

    let mut retained = Vec::new();
    let mut removals = Vec::new();
    for module_id in Reading::module_ids(readings) {
        let series = Reading::sensor_series(readings, &module_id);
        let initial = series.len();
        let in_range: Vec<Reading> = series
            .into_iter()
            .filter(|r| r.temperature > minimum && r.temperature < maximum)
            .collect();
        let (lat, long) = in_range
            .first()
            .map(|r| (r.lat, r.long))
            .unwrap_or_else(|| {
                let first = readings.iter().find(|r| r.module_id == module_id).unwrap();
                (first.lat, first.long)
            });
        removals.push(SensorRemoval::new(
            module_id,
            lat,
            long,
            year,
            initial,
            in_range.len(),
        ));
        retained.extend(in_range);
    }
    log::info!(
        "range filter: kept {} of {} readings inside [{minimum}, {maximum}]",
        retained.len(),
        readings.len()
    );
    (retained, removals)
}
