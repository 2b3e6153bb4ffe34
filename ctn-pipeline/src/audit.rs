//! Auditable side outputs: per-stage and per-sensor removal statistics.

use serde::Serialize;
use std::path::Path;

/// Whole-stage removal summary: how many readings went in, how many came
/// out, and the percentage removed.
#[derive(Debug, Clone, Serialize)]
pub struct StageRemovals {
    pub initial: usize,
    pub retained: usize,
    pub removed_pct: f64,
}

impl StageRemovals {
    pub fn new(initial: usize, retained: usize) -> Self {
        let removed_pct = if initial == 0 {
            0.0
        } else {
            (1.0 - retained as f64 / initial as f64) * 100.0
        };
        StageRemovals {
            initial,
            retained,
            removed_pct,
        }
    }
}

/// Per-sensor removal summary for stages that judge readings sensor by
/// sensor (range and bias filters).
#[derive(Debug, Clone, Serialize)]
pub struct SensorRemoval {
    pub module_id: String,
    pub lat: f64,
    pub long: f64,
    pub year: i32,
    pub initial: usize,
    pub retained: usize,
    pub removed_pct: f64,
}

impl SensorRemoval {
    pub fn new(
        module_id: String,
        lat: f64,
        long: f64,
        year: i32,
        initial: usize,
        retained: usize,
    ) -> Self {
        let removed_pct = if initial == 0 {
            0.0
        } else {
            (1.0 - retained as f64 / initial as f64) * 100.0
        };
        SensorRemoval {
            module_id,
            lat,
            long,
            year,
            initial,
            retained,
            removed_pct,
        }
    }
}

/// Per-sensor Pearson correlation against the virtual reference.
/// `pearson` is `None` when the time-aligned intersection is empty or has
/// zero variance; such sensors never survive the correlation filter.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationRecord {
    pub module_id: String,
    pub lat: f64,
    pub long: f64,
    pub year: i32,
    pub pearson: Option<f64>,
}

/// Per-sensor reliability of the whole cleaning run, with the sensor's
/// static metadata carried through for downstream reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ReliabilityRecord {
    pub module_id: String,
    pub n_original: usize,
    pub n_cleaned: usize,
    pub n_removed: usize,
    pub removed_fraction: f64,
    pub reliability: f64,
    pub device_id: String,
    pub lat: f64,
    pub long: f64,
    pub timezone: String,
    pub country: String,
    pub altitude: Option<f64>,
    pub city: String,
    pub street: String,
}

/// Write any audit table as CSV, one row per record.
pub fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
