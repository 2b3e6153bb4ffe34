//! Reliability filter: drop sensors that lost too much data to the
//! cleaning pipeline.

use crate::audit::{ReliabilityRecord, StageRemovals};
use ctn_core::reading::Reading;
use std::collections::HashSet;

/// Minimum surviving fraction for a sensor to be considered reliable.
pub const DEFAULT_RELIABILITY_THRESHOLD: f64 = 0.5;

/// Per-sensor observation counts before and after cleaning, with the
/// reliability ratio cleaned/original (0 when original is 0). Covers
/// every sensor present in either set; metadata comes from the sensor's
/// first original reading when it has one.
pub fn assess_reliability(original: &[Reading], cleaned: &[Reading]) -> Vec<ReliabilityRecord> {
    let mut module_ids = Reading::module_ids(original);
    for module_id in Reading::module_ids(cleaned) {
        if !module_ids.contains(&module_id) {
            module_ids.push(module_id);
        }
    }

    let mut records = Vec::new();
    for module_id in module_ids {
        let n_original = original.iter().filter(|r| r.module_id == module_id).count();
        let n_cleaned = cleaned.iter().filter(|r| r.module_id == module_id).count();
        let n_removed = n_original.saturating_sub(n_cleaned);
        let (removed_fraction, reliability) = if n_original == 0 {
            (0.0, 0.0)
        } else {
            (
                n_removed as f64 / n_original as f64,
                n_cleaned as f64 / n_original as f64,
            )
        };
        let template = original
            .iter()
            .chain(cleaned.iter())
            .find(|r| r.module_id == module_id)
            .unwrap();
        records.push(ReliabilityRecord {
            module_id,
            n_original,
            n_cleaned,
            n_removed,
            removed_fraction,
            reliability,
            device_id: template.device_id.clone(),
            lat: template.lat,
            long: template.long,
            timezone: template.timezone.clone(),
            country: template.country.clone(),
            altitude: template.altitude,
            city: template.city.clone(),
            street: template.street.clone(),
        });
    }
    records
}

/// Restrict the cleaned set to sensors whose reliability is at or above
/// the threshold.
pub fn remove_unreliable(
    cleaned: &[Reading],
    records: &[ReliabilityRecord],
    threshold: f64,
) -> (Vec<Reading>, StageRemovals) {
    let reliable: HashSet<&str> = records
        .iter()
        .filter(|r| r.reliability >= threshold)
        .map(|r| r.module_id.as_str())
        .collect();
    let retained: Vec<Reading> = cleaned
        .iter()
        .filter(|r| reliable.contains(r.module_id.as_str()))
        .cloned()
        .collect();
    let removals = StageRemovals::new(cleaned.len(), retained.len());
    log::info!(
        "reliability filter: {} of {} sensors reliable, kept {} of {} readings",
        reliable.len(),
        records.len(),
        retained.len(),
        cleaned.len()
    );
    (retained, removals)
}
