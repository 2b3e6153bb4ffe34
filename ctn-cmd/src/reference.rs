//! Build the hourly virtual reference station from raw trusted-network
//! readings.

use ctn_core::hour_range::month_bounds;
use ctn_core::reference::{
    read_reference_readings_csv, write_reference_csv, ReferenceReading, ReferenceSeries,
};
use ctn_pipeline::outlier::zscore_keep_mask;
use log::info;
use std::path::Path;

/// Z-score-clean the raw trusted readings per calendar month, then
/// aggregate the survivors into hourly statistics over the whole range
/// and write the virtual station CSV.
pub fn run_reference(
    readings_csv: &Path,
    out_csv: &Path,
    year: i32,
    start_month: u32,
    end_month: u32,
) -> anyhow::Result<()> {
    anyhow::ensure!(
        (1..=12).contains(&start_month) && (1..=12).contains(&end_month),
        "months must be within 1-12"
    );
    anyhow::ensure!(start_month <= end_month, "start month after end month");

    let readings = read_reference_readings_csv(readings_csv)?;
    info!(
        "reference: {} raw readings from {}",
        readings.len(),
        readings_csv.display()
    );

    let mut cleaned: Vec<ReferenceReading> = Vec::new();
    for month in start_month..=end_month {
        let (start, end) = month_bounds(year, month)
            .ok_or_else(|| anyhow::anyhow!("invalid month {year}-{month}"))?;
        let in_month: Vec<&ReferenceReading> = readings
            .iter()
            .filter(|r| r.time >= start && r.time < end)
            .collect();
        let values: Vec<f64> = in_month.iter().map(|r| r.value).collect();
        let mask = zscore_keep_mask(&values);
        let kept = in_month
            .iter()
            .zip(&mask)
            .filter(|(_, keep)| **keep)
            .map(|(r, _)| (*r).clone());
        let before = cleaned.len();
        cleaned.extend(kept);
        info!(
            "reference: month {month}: kept {} of {} readings",
            cleaned.len() - before,
            in_month.len()
        );
    }

    let (range_start, _) = month_bounds(year, start_month).unwrap();
    let (_, range_end) = month_bounds(year, end_month).unwrap();
    let series = ReferenceSeries::aggregate(&cleaned, range_start, range_end);
    write_reference_csv(out_csv, &series)?;
    info!(
        "reference: wrote {} hourly buckets to {}",
        series.statistics().len(),
        out_csv.display()
    );
    Ok(())
}
