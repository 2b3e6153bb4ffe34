use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

/// Columns a readings CSV must carry. A file missing any of these is
/// structurally invalid and aborts the batch.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "device_id",
    "module_id",
    "time",
    "temperature",
    "lat",
    "long",
    "timezone",
    "country",
    "altitude",
    "city",
    "street",
];

/// Timestamp normalization for network readings.
///
/// Source files carry a mix of zone-tagged (`2022-06-01 12:00:00+00:00`)
/// and naive (`2022-06-01 12:00:00`) timestamps. Both parse to one naive
/// convention here, so no other module ever re-interprets time strings.
pub mod time_format {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub const NAIVE: &str = "%Y-%m-%d %H:%M:%S";
    pub const ZONED: &str = "%Y-%m-%d %H:%M:%S%:z";

    /// Parse either timestamp convention into a naive instant.
    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, NAIVE) {
            return Some(t);
        }
        DateTime::parse_from_str(s, ZONED)
            .ok()
            .map(|t| t.naive_utc())
    }

    pub fn serialize<S: Serializer>(t: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&t.format(NAIVE).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("bad timestamp: {s}")))
    }
}

/// A single crowd-sourced observation: one outdoor module, one instant,
/// one temperature, plus the static station metadata the provider attaches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub device_id: String,
    pub module_id: String,
    #[serde(with = "time_format")]
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub lat: f64,
    pub long: f64,
    pub timezone: String,
    pub country: String,
    pub altitude: Option<f64>,
    pub city: String,
    pub street: String,
}

impl Ord for Reading {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time.cmp(&other.time)
    }
}

impl Eq for Reading {}

impl PartialEq for Reading {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.module_id == other.module_id
    }
}

impl PartialOrd for Reading {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Reading {
    /// Unique module ids in first-seen order. Rows with an empty module id
    /// are unattributable and skipped.
    pub fn module_ids(readings: &[Reading]) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for reading in readings {
            if reading.module_id.is_empty() {
                continue;
            }
            if !seen.iter().any(|id| id == &reading.module_id) {
                seen.push(reading.module_id.clone());
            }
        }
        seen
    }

    /// Materialize one sensor's series from the full reading set.
    ///
    /// A module id can show up at more than one coordinate pair (relocated
    /// or re-registered hardware); only readings at the dominant pair (most
    /// frequent, first seen on ties) are kept together.
    pub fn sensor_series(readings: &[Reading], module_id: &str) -> Vec<Reading> {
        let of_module: Vec<&Reading> = readings
            .iter()
            .filter(|r| r.module_id == module_id)
            .collect();
        let Some(dominant) = dominant_coordinate(&of_module) else {
            return Vec::new();
        };
        of_module
            .into_iter()
            .filter(|r| (r.lat.to_bits(), r.long.to_bits()) == dominant)
            .cloned()
            .collect()
    }

}

fn dominant_coordinate(readings: &[&Reading]) -> Option<(u64, u64)> {
    let mut counts: Vec<((u64, u64), usize)> = Vec::new();
    for reading in readings {
        let key = (reading.lat.to_bits(), reading.long.to_bits());
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }
    // max_by_key on the count; earlier entries win ties because max_by_key
    // returns the last maximum and we scan in reverse
    counts
        .iter()
        .rev()
        .max_by_key(|(_, n)| *n)
        .map(|(k, _)| *k)
}

/// Read a readings CSV. Individually malformed rows are skipped with a
/// warning and counted; structurally invalid files (missing columns) fail.
pub fn read_readings_csv(path: &Path) -> anyhow::Result<Vec<Reading>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            anyhow::bail!(
                "readings file {} is missing required column '{}'",
                path.display(),
                column
            );
        }
    }
    let mut readings = Vec::new();
    let mut skipped = 0usize;
    for row in reader.deserialize::<Reading>() {
        match row {
            Ok(reading) => readings.push(reading),
            Err(e) => {
                skipped += 1;
                log::warn!("skipping malformed reading row: {e}");
            }
        }
    }
    if skipped > 0 {
        log::warn!(
            "{}: skipped {} malformed rows, kept {}",
            path.display(),
            skipped,
            readings.len()
        );
    }
    Ok(readings)
}

/// Write a readings table, one row per surviving observation. The header
/// row is written even with zero survivors, so an empty table reads back
/// as an empty set rather than a structurally invalid file.
pub fn write_readings_csv(path: &Path, readings: &[Reading]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    if readings.is_empty() {
        writer.write_record(REQUIRED_COLUMNS)?;
    }
    for reading in readings {
        writer.serialize(reading)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{read_readings_csv, time_format, write_readings_csv, Reading};
    use chrono::{NaiveDate, NaiveDateTime};

    pub fn reading(module_id: &str, time: NaiveDateTime, temperature: f64) -> Reading {
        Reading {
            device_id: format!("dev-{module_id}"),
            module_id: module_id.to_string(),
            time,
            temperature,
            lat: 45.46,
            long: 9.19,
            timezone: "Europe/Rome".to_string(),
            country: "IT".to_string(),
            altitude: Some(120.0),
            city: "Milan".to_string(),
            street: "Via Torino".to_string(),
        }
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_mixed_timestamp_formats_normalize() {
        let zoned = time_format::parse("2022-06-01 12:00:00+00:00").unwrap();
        let naive = time_format::parse("2022-06-01 12:00:00").unwrap();
        assert_eq!(zoned, naive);
        assert!(time_format::parse("not a time").is_none());
    }

    #[test]
    fn test_module_ids_skips_empty_and_deduplicates() {
        let readings = vec![
            reading("a", at(0, 0), 20.0),
            reading("", at(1, 0), 20.0),
            reading("b", at(2, 0), 20.0),
            reading("a", at(3, 0), 20.0),
        ];
        assert_eq!(Reading::module_ids(&readings), vec!["a", "b"]);
    }

    #[test]
    fn test_sensor_series_keeps_dominant_coordinate() {
        let mut readings = vec![
            reading("a", at(0, 0), 20.0),
            reading("a", at(1, 0), 21.0),
            reading("a", at(2, 0), 22.0),
        ];
        // same module id re-registered elsewhere
        let mut moved = reading("a", at(3, 0), 30.0);
        moved.lat = 46.0;
        moved.long = 10.0;
        readings.push(moved);

        let series = Reading::sensor_series(&readings, "a");
        assert_eq!(series.len(), 3);
        assert!(series.iter().all(|r| r.lat == 45.46));
    }

    #[test]
    fn test_empty_survivor_table_round_trips() {
        // a month where every reading was filtered out still writes a
        // parseable table; downstream resampling sees zero readings
        let path = std::env::temp_dir().join("ctn_core_empty_readings.csv");
        write_readings_csv(&path, &[]).unwrap();
        let restored = read_readings_csv(&path).unwrap();
        assert!(restored.is_empty());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_populated_table_round_trips() {
        let path = std::env::temp_dir().join("ctn_core_two_readings.csv");
        let readings = vec![reading("a", at(0, 0), 20.0), reading("b", at(1, 0), 21.5)];
        write_readings_csv(&path, &readings).unwrap();
        let restored = read_readings_csv(&path).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[1].temperature, 21.5);
        assert_eq!(restored[1].module_id, "b");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_sensor_series_coordinate_tie_keeps_first_seen() {
        let mut far = reading("a", at(1, 0), 25.0);
        far.lat = 46.0;
        let readings = vec![reading("a", at(0, 0), 20.0), far];
        let series = Reading::sensor_series(&readings, "a");
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].lat, 45.46);
    }
}
