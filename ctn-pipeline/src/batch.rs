//! The fixed-order month batch: stages 2 through 9 over one year/month
//! unit of work.

use crate::audit::{CorrelationRecord, ReliabilityRecord, SensorRemoval, StageRemovals};
use crate::{bias, correlation, irregularity, outlier, range, reliability, smoothing, spatial};
use ctn_core::aoi::AreaOfInterest;
use ctn_core::reading::Reading;
use ctn_core::reference::ReferenceSeries;

/// Tunable thresholds for a cleaning run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineParams {
    pub correlation_threshold: f64,
    pub reliability_threshold: f64,
}

impl Default for PipelineParams {
    fn default() -> Self {
        PipelineParams {
            correlation_threshold: correlation::DEFAULT_CORRELATION_THRESHOLD,
            reliability_threshold: reliability::DEFAULT_RELIABILITY_THRESHOLD,
        }
    }
}

/// Every intermediate survivor set and audit table of one month batch.
/// Each stage consumed the previous stage's survivors; `filtered` is the
/// final cleaned set.
#[derive(Debug)]
pub struct CleanedBatch {
    pub outlier_free: Vec<Reading>,
    pub within_area: Vec<Reading>,
    pub spatial_removals: StageRemovals,
    pub realistic: Vec<Reading>,
    pub range_audit: Vec<SensorRemoval>,
    pub correlations: Vec<CorrelationRecord>,
    pub correlation_removals: StageRemovals,
    pub high_corr: Vec<Reading>,
    pub unbiased: Vec<Reading>,
    pub bias_removals: StageRemovals,
    pub bias_audit: Vec<SensorRemoval>,
    pub smoothed: Vec<Reading>,
    pub regular: Vec<Reading>,
    pub reliability: Vec<ReliabilityRecord>,
    pub reliability_removals: StageRemovals,
    pub filtered: Vec<Reading>,
}

/// Run the full cleaning pipeline on one month of readings.
///
/// Stage order is fixed: outliers, spatial clip, range, correlation,
/// bias, smoothing, irregularity, reliability. The reliability assessment
/// compares the original input against the post-irregularity survivors.
/// `aoi` is optional for inputs that are already clipped upstream.
pub fn clean_month(
    readings: &[Reading],
    reference: &ReferenceSeries,
    aoi: Option<&AreaOfInterest>,
    year: i32,
    params: &PipelineParams,
) -> CleanedBatch {
    let outlier_free = outlier::remove_outliers(readings);

    let (within_area, spatial_removals) = match aoi {
        Some(aoi) => spatial::clip_to_area(&outlier_free, aoi),
        None => {
            let n = outlier_free.len();
            (outlier_free.clone(), StageRemovals::new(n, n))
        }
    };

    let (realistic, range_audit) = range::remove_unrealistic(&within_area, reference, year);

    let correlations = correlation::compute_correlations(&realistic, reference, year);
    let (high_corr, correlation_removals) =
        correlation::remove_low_correlation(&realistic, &correlations, params.correlation_threshold);

    let (unbiased, bias_removals, bias_audit) = bias::remove_biased(&high_corr, reference, year);

    let smoothed = smoothing::smooth_local_spikes(&unbiased);

    let regular = irregularity::enforce_minimum_cadence(&smoothed);

    let reliability_records = reliability::assess_reliability(readings, &regular);
    let (filtered, reliability_removals) =
        reliability::remove_unreliable(&regular, &reliability_records, params.reliability_threshold);

    log::info!(
        "batch complete: {} of {} readings survived all stages",
        filtered.len(),
        readings.len()
    );

    CleanedBatch {
        outlier_free,
        within_area,
        spatial_removals,
        realistic,
        range_audit,
        correlations,
        correlation_removals,
        high_corr,
        unbiased,
        bias_removals,
        bias_audit,
        smoothed,
        regular,
        reliability: reliability_records,
        reliability_removals,
        filtered,
    }
}

#[cfg(test)]
mod tests {
    use super::{clean_month, PipelineParams};
    use crate::fixtures::{at, reading};
    use ctn_core::reading::Reading;
    use ctn_core::reference::{ReferenceReading, ReferenceSeries};

    /// A reference that ramps 10..34 over 24 hours of day 1, with two
    /// observations per hour (value ± 1, so each bucket has some spread).
    fn reference() -> ReferenceSeries {
        let mut raw = Vec::new();
        for h in 0..24u32 {
            let center = 10.0 + h as f64;
            raw.push(ReferenceReading { time: at(1, h, 15), value: center - 1.0 });
            raw.push(ReferenceReading { time: at(1, h, 45), value: center + 1.0 });
        }
        ReferenceSeries::aggregate(&raw, at(1, 0, 0), at(2, 0, 0))
    }

    /// A sensor tracking the reference on crowd hour labels (:30).
    fn tracking_sensor(module_id: &str, offset: f64) -> Vec<Reading> {
        (0..24u32)
            .map(|h| reading(module_id, at(1, h, 30), 10.0 + h as f64 + offset))
            .collect()
    }

    #[test]
    fn test_well_behaved_sensor_survives_end_to_end() {
        let readings = tracking_sensor("good", 0.5);
        let batch = clean_month(&readings, &reference(), None, 2022, &PipelineParams::default());
        assert_eq!(batch.filtered.len(), 24);
        let good = batch.reliability.iter().find(|r| r.module_id == "good").unwrap();
        assert_eq!(good.reliability, 1.0);
        assert!(batch.correlations[0].pearson.unwrap() > 0.99);
    }

    #[test]
    fn test_uncorrelated_sensor_dropped_whole() {
        let mut readings = tracking_sensor("good", 0.5);
        // a sensor moving against the reference all day
        readings.extend(
            (0..24u32).map(|h| reading("bad", at(1, h, 30), 34.0 - h as f64)),
        );
        let batch = clean_month(&readings, &reference(), None, 2022, &PipelineParams::default());
        assert!(batch.filtered.iter().all(|r| r.module_id == "good"));
        let bad = batch
            .correlations
            .iter()
            .find(|r| r.module_id == "bad")
            .unwrap();
        assert!(bad.pearson.unwrap() < 0.6);
    }

    #[test]
    fn test_stage_outputs_shrink_monotonically() {
        let mut readings = tracking_sensor("good", 0.5);
        readings.push(reading("good", at(1, 3, 40), 12.0)); // sub-hour gap
        let batch = clean_month(&readings, &reference(), None, 2022, &PipelineParams::default());
        assert!(batch.outlier_free.len() <= readings.len());
        assert!(batch.realistic.len() <= batch.within_area.len());
        assert!(batch.high_corr.len() <= batch.realistic.len());
        assert!(batch.unbiased.len() <= batch.high_corr.len());
        // smoothing never changes row count
        assert_eq!(batch.smoothed.len(), batch.unbiased.len());
        assert!(batch.regular.len() < batch.smoothed.len());
        assert!(batch.filtered.len() <= batch.regular.len());
    }

    #[test]
    fn test_empty_input_yields_empty_batch() {
        let batch = clean_month(&[], &reference(), None, 2022, &PipelineParams::default());
        assert!(batch.filtered.is_empty());
        assert!(batch.reliability.is_empty());
        assert_eq!(batch.spatial_removals.initial, 0);
    }
}
