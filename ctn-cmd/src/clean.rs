//! Run the full cleaning pipeline on one year/month batch and write the
//! per-stage survivor and audit tables.

use crate::files;
use ctn_core::aoi::AreaOfInterest;
use ctn_core::reading::{read_readings_csv, write_readings_csv};
use ctn_core::reference::read_reference_csv;
use ctn_pipeline::audit::write_table;
use ctn_pipeline::batch::{clean_month, PipelineParams};
use log::info;
use std::path::Path;

pub fn run_clean(
    readings_csv: &Path,
    reference_csv: &Path,
    aoi_geojson: Option<&Path>,
    out_dir: &Path,
    year: i32,
    month: u32,
    params: PipelineParams,
) -> anyhow::Result<()> {
    anyhow::ensure!((1..=12).contains(&month), "month must be within 1-12");
    std::fs::create_dir_all(out_dir)?;

    let readings = read_readings_csv(readings_csv)?;
    let reference = read_reference_csv(reference_csv)?;
    let aoi = aoi_geojson
        .map(AreaOfInterest::from_geojson_file)
        .transpose()?;

    info!(
        "clean {year}-{month:02}: {} readings, {} reference buckets",
        readings.len(),
        reference.statistics().len()
    );

    let batch = clean_month(&readings, &reference, aoi.as_ref(), year, &params);

    // survivor tables, one per stage
    write_readings_csv(
        &files::stage_path(out_dir, year, month, "outlier_free"),
        &batch.outlier_free,
    )?;
    write_readings_csv(
        &files::stage_path(out_dir, year, month, "within_area"),
        &batch.within_area,
    )?;
    write_readings_csv(
        &files::stage_path(out_dir, year, month, "realistic"),
        &batch.realistic,
    )?;
    write_readings_csv(
        &files::stage_path(out_dir, year, month, "high_corr"),
        &batch.high_corr,
    )?;
    write_readings_csv(
        &files::stage_path(out_dir, year, month, "unbiased"),
        &batch.unbiased,
    )?;
    write_readings_csv(
        &files::stage_path(out_dir, year, month, "clean"),
        &batch.smoothed,
    )?;
    write_readings_csv(
        &files::stage_path(out_dir, year, month, "clip"),
        &batch.regular,
    )?;
    write_readings_csv(
        &files::stage_path(out_dir, year, month, "filtered"),
        &batch.filtered,
    )?;

    // audit tables
    write_table(
        &files::audit_path(out_dir, year, month, "spatial"),
        &[batch.spatial_removals],
    )?;
    write_table(
        &files::audit_path(out_dir, year, month, "unrealistic"),
        &batch.range_audit,
    )?;
    write_table(
        &files::correlation_path(out_dir, year, month),
        &batch.correlations,
    )?;
    write_table(
        &files::audit_path(out_dir, year, month, "correlation"),
        &[batch.correlation_removals],
    )?;
    write_table(
        &files::audit_path(out_dir, year, month, "biased_tot"),
        &[batch.bias_removals],
    )?;
    write_table(
        &files::audit_path(out_dir, year, month, "biased_station"),
        &batch.bias_audit,
    )?;
    write_table(
        &files::reliability_path(out_dir, year, month),
        &batch.reliability,
    )?;

    info!(
        "clean {year}-{month:02}: wrote tables to {}",
        out_dir.display()
    );
    Ok(())
}
