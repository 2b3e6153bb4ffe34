//! Stable output-file naming. Downstream reporting parses these names,
//! so the year/month encoding must not change between runs.

use std::path::{Path, PathBuf};

/// Per-stage survivor table: `readings_{year}-{month:02}_{stage}.csv`.
pub fn stage_path(dir: &Path, year: i32, month: u32, stage: &str) -> PathBuf {
    dir.join(format!("readings_{year}-{month:02}_{stage}.csv"))
}

/// Correlation record table for one batch.
pub fn correlation_path(dir: &Path, year: i32, month: u32) -> PathBuf {
    dir.join(format!("corr_reference_{year}-{month:02}.csv"))
}

/// Reliability record table for one batch.
pub fn reliability_path(dir: &Path, year: i32, month: u32) -> PathBuf {
    dir.join(format!("stations_reliability_{year}-{month:02}.csv"))
}

/// Audit table for one named stage of one batch.
pub fn audit_path(dir: &Path, year: i32, month: u32, stage: &str) -> PathBuf {
    dir.join(format!("readings_{year}-{month:02}_{stage}_stats.csv"))
}

/// Period statistics table. Monthly/daily tables carry the month in the
/// name; seasonal/annual tables are keyed by year alone.
pub fn stats_path(
    dir: &Path,
    granularity: &str,
    year: i32,
    month: Option<u32>,
) -> PathBuf {
    match month {
        Some(m) => dir.join(format!("stats_{granularity}_{year}-{m:02}.csv")),
        None => dir.join(format!("stats_{granularity}_{year}.csv")),
    }
}
