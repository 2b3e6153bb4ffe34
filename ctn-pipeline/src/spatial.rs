//! Spatial filter: clip readings to the area of interest.

use crate::audit::StageRemovals;
use ctn_core::aoi::AreaOfInterest;
use ctn_core::reading::Reading;

/// Retain readings whose coordinates fall within the boundary. Readings
/// with non-finite coordinates cannot be placed and are removed.
pub fn clip_to_area(readings: &[Reading], aoi: &AreaOfInterest) -> (Vec<Reading>, StageRemovals) {
    let retained: Vec<Reading> = readings
        .iter()
        .filter(|r| aoi.contains(r.lat, r.long))
        .cloned()
        .collect();
    let removals = StageRemovals::new(readings.len(), retained.len());
    log::info!(
        "spatial filter: kept {} of {} readings",
        retained.len(),
        readings.len()
    );
    (retained, removals)
}
