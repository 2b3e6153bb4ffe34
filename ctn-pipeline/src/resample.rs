//! Temporal aggregation: resample cleaned readings into daily, monthly,
//! seasonal, and annual statistics per sensor.
//!
//! One bucket algorithm serves every granularity; callers compose
//! per-period tables into a range and [`complete_grid`] fills the
//! sensors-by-buckets grid so every sensor has exactly one row per
//! requested period, zero-filled where no data exists.

use chrono::{NaiveDate, NaiveDateTime};
use ctn_core::hour_range::month_bounds;
use ctn_core::reading::Reading;
use ctn_core::stats;
use serde::Serialize;
use std::collections::HashMap;

/// Months of the summer season used for seasonal aggregation.
pub const SEASON_MONTHS: [u32; 3] = [6, 7, 8];

/// Temperature statistics for one sensor over one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodStatistic {
    pub module_id: String,
    pub period: NaiveDate,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

impl PeriodStatistic {
    /// The explicit "no data this period" row. Zero-fill is a deliberate
    /// policy choice: downstream consumers expect a dense grid, at the
    /// cost of conflating "no data" with an actual zero.
    pub fn zero_filled(module_id: String, period: NaiveDate) -> Self {
        PeriodStatistic {
            module_id,
            period,
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            median: 0.0,
            std: 0.0,
        }
    }
}

/// One period's statistics for every sensor that had data in it. The
/// table carries its period label even when empty, so range assembly can
/// still account for the bucket.
#[derive(Debug, Clone)]
pub struct PeriodTable {
    pub period: NaiveDate,
    pub rows: Vec<PeriodStatistic>,
}

/// Deduplicated per-sensor metadata, joined back onto period statistics
/// for output rows.
#[derive(Debug, Clone, Serialize)]
pub struct SensorInfo {
    pub module_id: String,
    pub device_id: String,
    pub lat: f64,
    pub long: f64,
    pub timezone: String,
    pub country: String,
    pub altitude: Option<f64>,
    pub city: String,
    pub street: String,
}

/// First-seen metadata per module id.
pub fn sensor_directory(readings: &[Reading]) -> HashMap<String, SensorInfo> {
    let mut directory = HashMap::new();
    for reading in readings {
        if reading.module_id.is_empty() {
            continue;
        }
        directory
            .entry(reading.module_id.clone())
            .or_insert_with(|| SensorInfo {
                module_id: reading.module_id.clone(),
                device_id: reading.device_id.clone(),
                lat: reading.lat,
                long: reading.long,
                timezone: reading.timezone.clone(),
                country: reading.country.clone(),
                altitude: reading.altitude,
                city: reading.city.clone(),
                street: reading.street.clone(),
            });
    }
    directory
}

/// Group readings by sensor within `[start, end)` and compute the period
/// statistics. Sample std; a single observation yields std 0.
pub fn resample_period(
    readings: &[Reading],
    start: NaiveDateTime,
    end: NaiveDateTime,
    period: NaiveDate,
) -> PeriodTable {
    let mut by_module: HashMap<&str, Vec<f64>> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for reading in readings {
        if reading.module_id.is_empty() || reading.time < start || reading.time >= end {
            continue;
        }
        let entry = by_module.entry(reading.module_id.as_str()).or_default();
        if entry.is_empty() {
            order.push(reading.module_id.as_str());
        }
        entry.push(reading.temperature);
    }

    let rows = order
        .into_iter()
        .map(|module_id| {
            let values = &by_module[module_id];
            PeriodStatistic {
                module_id: module_id.to_string(),
                period,
                min: stats::min(values).unwrap(),
                max: stats::max(values).unwrap(),
                mean: stats::mean(values).unwrap(),
                median: stats::median(values).unwrap(),
                std: stats::std_sample(values).unwrap_or(0.0),
            }
        })
        .collect();
    PeriodTable { period, rows }
}

/// One table per day of the given calendar month.
pub fn daily_tables(readings: &[Reading], year: i32, month: u32) -> Vec<PeriodTable> {
    let (month_start, month_end) = month_bounds(year, month).unwrap();
    let mut tables = Vec::new();
    let mut day = month_start.date();
    while day < month_end.date() {
        let next = day.succ_opt().unwrap();
        tables.push(resample_period(
            readings,
            day.and_hms_opt(0, 0, 0).unwrap(),
            next.and_hms_opt(0, 0, 0).unwrap(),
            day,
        ));
        day = next;
    }
    tables
}

/// One table for the whole calendar month, labeled by its first day.
pub fn monthly_table(readings: &[Reading], year: i32, month: u32) -> PeriodTable {
    let (start, end) = month_bounds(year, month).unwrap();
    resample_period(readings, start, end, start.date())
}

/// Assemble per-period tables into the complete sensor-by-period grid.
///
/// Every sensor appearing anywhere in the input gets exactly one row for
/// every table's period; periods with no data for a sensor become
/// zero-filled rows. The grid covers only the periods actually passed in,
/// which is what makes partial years work: nine monthly tables yield nine
/// rows per sensor, never twelve.
pub fn complete_grid(tables: &[PeriodTable]) -> Vec<PeriodStatistic> {
    let mut sensors: Vec<&str> = Vec::new();
    for table in tables {
        for row in &table.rows {
            if !sensors.contains(&row.module_id.as_str()) {
                sensors.push(row.module_id.as_str());
            }
        }
    }
    sensors.sort_unstable();

    let mut grid = Vec::with_capacity(sensors.len() * tables.len());
    for sensor in &sensors {
        for table in tables {
            let row = table
                .rows
                .iter()
                .find(|r| r.module_id == *sensor)
                .cloned()
                .unwrap_or_else(|| PeriodStatistic::zero_filled(sensor.to_string(), table.period));
            grid.push(row);
        }
    }
    grid
}
