//! Resample cleaned batches into daily, monthly, seasonal, or annual
//! period statistics.

use crate::files;
use chrono::NaiveDate;
use clap::ValueEnum;
use ctn_core::reading::{read_readings_csv, Reading};
use ctn_pipeline::resample::{
    complete_grid, daily_tables, monthly_table, sensor_directory, PeriodStatistic, PeriodTable,
    SEASON_MONTHS,
};
use log::info;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Granularity {
    Daily,
    Monthly,
    Seasonal,
    Annual,
}

/// One output row: period statistics joined with the sensor's metadata.
#[derive(Debug, Serialize)]
struct PeriodStatRow {
    time: NaiveDate,
    min_temp: f64,
    mean: f64,
    median: f64,
    max_temp: f64,
    std: f64,
    device_id: String,
    module_id: String,
    lat: f64,
    long: f64,
    timezone: String,
    country: String,
    altitude: Option<f64>,
    city: String,
    street: String,
}

pub fn run_resample(
    clean_dir: &Path,
    out_dir: &Path,
    year: i32,
    month: Option<u32>,
    granularity: Granularity,
    stage: &str,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(out_dir)?;
    match granularity {
        Granularity::Daily => {
            let month = require_month(month, "daily")?;
            let readings = read_stage(clean_dir, year, month, stage)?;
            let tables = daily_tables(&readings, year, month);
            write_stats(
                &files::stats_path(out_dir, "daily", year, Some(month)),
                &tables,
                &readings,
            )
        }
        Granularity::Monthly => {
            let month = require_month(month, "monthly")?;
            let readings = read_stage(clean_dir, year, month, stage)?;
            let tables = vec![monthly_table(&readings, year, month)];
            write_stats(
                &files::stats_path(out_dir, "monthly", year, Some(month)),
                &tables,
                &readings,
            )
        }
        Granularity::Seasonal => {
            let (tables, readings) = monthly_range(clean_dir, year, &SEASON_MONTHS, stage)?;
            write_stats(
                &files::stats_path(out_dir, "seasonal", year, None),
                &tables,
                &readings,
            )
        }
        Granularity::Annual => {
            let months: Vec<u32> = (1..=12).collect();
            let (tables, readings) = monthly_range(clean_dir, year, &months, stage)?;
            write_stats(
                &files::stats_path(out_dir, "annual", year, None),
                &tables,
                &readings,
            )
        }
    }
}

fn require_month(month: Option<u32>, granularity: &str) -> anyhow::Result<u32> {
    let month =
        month.ok_or_else(|| anyhow::anyhow!("{granularity} resampling requires --month"))?;
    anyhow::ensure!((1..=12).contains(&month), "month must be within 1-12");
    Ok(month)
}

fn read_stage(dir: &Path, year: i32, month: u32, stage: &str) -> anyhow::Result<Vec<Reading>> {
    let path = files::stage_path(dir, year, month, stage);
    anyhow::ensure!(
        path.exists(),
        "cleaned table {} not found; run `clean` first",
        path.display()
    );
    read_readings_csv(&path)
}

/// Build monthly tables for every month of the range whose cleaned table
/// exists. Absent months are skipped, which is how a partial year ends up
/// with fewer buckets instead of zero-padded ones.
fn monthly_range(
    dir: &Path,
    year: i32,
    months: &[u32],
    stage: &str,
) -> anyhow::Result<(Vec<PeriodTable>, Vec<Reading>)> {
    let mut tables = Vec::new();
    let mut all_readings = Vec::new();
    for &month in months {
        let path = files::stage_path(dir, year, month, stage);
        if !path.exists() {
            info!("resample: no cleaned table for {year}-{month:02}, skipping");
            continue;
        }
        let readings = read_readings_csv(&path)?;
        tables.push(monthly_table(&readings, year, month));
        all_readings.extend(readings);
    }
    anyhow::ensure!(
        !tables.is_empty(),
        "no cleaned tables found under {} for {year}",
        dir.display()
    );
    Ok((tables, all_readings))
}

fn write_stats(
    out_path: &Path,
    tables: &[PeriodTable],
    readings: &[Reading],
) -> anyhow::Result<()> {
    let grid = complete_grid(tables);
    let directory = sensor_directory(readings);
    let rows: Vec<PeriodStatRow> = grid
        .into_iter()
        .map(|stat| join_metadata(stat, &directory))
        .collect();
    let mut writer = csv::Writer::from_path(out_path)?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("resample: wrote {} rows to {}", rows.len(), out_path.display());
    Ok(())
}

fn join_metadata(
    stat: PeriodStatistic,
    directory: &HashMap<String, ctn_pipeline::resample::SensorInfo>,
) -> PeriodStatRow {
    // every sensor in the grid came from the same readings the directory
    // was built from
    let info = &directory[&stat.module_id];
    PeriodStatRow {
        time: stat.period,
        min_temp: stat.min,
        mean: stat.mean,
        median: stat.median,
        max_temp: stat.max,
        std: stat.std,
        device_id: info.device_id.clone(),
        module_id: stat.module_id,
        lat: info.lat,
        long: info.long,
        timezone: info.timezone.clone(),
        country: info.country.clone(),
        altitude: info.altitude,
        city: info.city.clone(),
        street: info.street.clone(),
    }
}
