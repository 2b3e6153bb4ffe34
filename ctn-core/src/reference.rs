use crate::hour_range::{floor_hour, HourRange};
use crate::reading::time_format;
use crate::stats;
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// The crowd network labels hours on the half hour while the reference
/// network labels them on the hour. Every alignment between the two goes
/// through [`ReferenceSeries::aligned`], which applies this offset once.
pub const NETWORK_ALIGNMENT_OFFSET_MINUTES: i64 = 30;

/// One raw observation from the trusted reference network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceReading {
    #[serde(with = "time_format")]
    pub time: NaiveDateTime,
    pub value: f64,
}

/// One hour's summary of the trusted network, keyed by hour start.
/// An hour with no observations carries `None` statistics and count 0;
/// `None` is never collapsed to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStatistic {
    #[serde(with = "time_format")]
    pub time: NaiveDateTime,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub std: Option<f64>,
    pub count: usize,
}

/// The hourly virtual reference signal: ordered statistics plus an index
/// by hour start. Built once per run and shared read-only downstream.
#[derive(Debug, Clone)]
pub struct ReferenceSeries {
    statistics: Vec<ReferenceStatistic>,
    index: HashMap<NaiveDateTime, usize>,
}

impl ReferenceSeries {
    /// Wrap pre-aggregated hourly statistics from the provider.
    pub fn from_statistics(statistics: Vec<ReferenceStatistic>) -> Self {
        let index = statistics
            .iter()
            .enumerate()
            .map(|(i, s)| (s.time, i))
            .collect();
        ReferenceSeries { statistics, index }
    }

    /// Aggregate raw reference readings into hourly statistics over
    /// `[start, end)`.
    ///
    /// A reading contributes to the bucket whose open interval
    /// `(bucket_start, bucket_start + 1h)` contains it; readings landing
    /// exactly on an hour boundary match no bucket. Readings are indexed
    /// by floor-hour up front so each bucket is a map lookup instead of a
    /// full scan.
    pub fn aggregate(
        readings: &[ReferenceReading],
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        let mut by_hour: HashMap<NaiveDateTime, Vec<f64>> = HashMap::new();
        for reading in readings {
            let bucket = floor_hour(reading.time);
            if reading.time == bucket {
                // exactly on the boundary: outside every open interval
                continue;
            }
            by_hour.entry(bucket).or_default().push(reading.value);
        }

        let empty: Vec<f64> = Vec::new();
        let statistics = HourRange(start, end)
            .map(|hour| {
                let values = by_hour.get(&hour).unwrap_or(&empty);
                ReferenceStatistic {
                    time: hour,
                    mean: stats::mean(values),
                    median: stats::median(values),
                    min: stats::min(values),
                    max: stats::max(values),
                    std: stats::std_population(values),
                    count: values.len(),
                }
            })
            .collect();
        ReferenceSeries::from_statistics(statistics)
    }

    pub fn statistics(&self) -> &[ReferenceStatistic] {
        &self.statistics
    }

    /// Statistic for the bucket starting at `hour`, if one exists.
    pub fn at(&self, hour: NaiveDateTime) -> Option<&ReferenceStatistic> {
        self.index.get(&hour).map(|i| &self.statistics[*i])
    }

    /// The reference view the crowd network compares against: every bucket
    /// re-keyed by its half-hour-shifted label.
    pub fn aligned(&self) -> AlignedReference<'_> {
        let offset = TimeDelta::try_minutes(NETWORK_ALIGNMENT_OFFSET_MINUTES).unwrap();
        let index = self
            .statistics
            .iter()
            .map(|s| (s.time + offset, s))
            .collect();
        AlignedReference { index }
    }

    /// Lowest observed hourly minimum across the whole series.
    pub fn min_temperature(&self) -> Option<f64> {
        self.statistics
            .iter()
            .filter_map(|s| s.min)
            .reduce(f64::min)
    }

    /// Highest observed hourly maximum across the whole series.
    pub fn max_temperature(&self) -> Option<f64> {
        self.statistics
            .iter()
            .filter_map(|s| s.max)
            .reduce(f64::max)
    }
}

/// A read-only view of a [`ReferenceSeries`] keyed by the crowd network's
/// hour labels.
pub struct AlignedReference<'a> {
    index: HashMap<NaiveDateTime, &'a ReferenceStatistic>,
}

impl AlignedReference<'_> {
    pub fn at(&self, time: NaiveDateTime) -> Option<&ReferenceStatistic> {
        self.index.get(&time).copied()
    }
}

/// Read an hourly reference statistics CSV into a series.
pub fn read_reference_csv(path: &Path) -> anyhow::Result<ReferenceSeries> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut statistics = Vec::new();
    for row in reader.deserialize::<ReferenceStatistic>() {
        statistics.push(row?);
    }
    Ok(ReferenceSeries::from_statistics(statistics))
}

/// Write an hourly reference statistics CSV. Undefined statistics become
/// empty fields, not zeros.
pub fn write_reference_csv(path: &Path, series: &ReferenceSeries) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for statistic in series.statistics() {
        writer.serialize(statistic)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read raw (not yet aggregated) reference network readings.
pub fn read_reference_readings_csv(path: &Path) -> anyhow::Result<Vec<ReferenceReading>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut readings = Vec::new();
    let mut skipped = 0usize;
    for row in reader.deserialize::<ReferenceReading>() {
        match row {
            Ok(reading) => readings.push(reading),
            Err(e) => {
                skipped += 1;
                log::warn!("skipping malformed reference row: {e}");
            }
        }
    }
    if skipped > 0 {
        log::warn!("{}: skipped {} malformed reference rows", path.display(), skipped);
    }
    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::{ReferenceReading, ReferenceSeries};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn reading(h: u32, m: u32, value: f64) -> ReferenceReading {
        ReferenceReading { time: at(h, m), value }
    }

    #[test]
    fn test_aggregate_open_interval_excludes_boundaries() {
        let readings = vec![
            reading(10, 0, 100.0), // exactly on the boundary: no bucket
            reading(10, 10, 18.0),
            reading(10, 50, 22.0),
            reading(11, 0, 100.0), // next boundary, also excluded
        ];
        let series = ReferenceSeries::aggregate(&readings, at(10, 0), at(12, 0));
        let bucket = series.at(at(10, 0)).unwrap();
        assert_eq!(bucket.count, 2);
        assert_eq!(bucket.mean, Some(20.0));
        assert_eq!(bucket.min, Some(18.0));
        assert_eq!(bucket.max, Some(22.0));
    }

    #[test]
    fn test_aggregate_empty_bucket_is_undefined_not_zero() {
        let readings = vec![reading(10, 30, 20.0)];
        let series = ReferenceSeries::aggregate(&readings, at(10, 0), at(12, 0));
        let empty = series.at(at(11, 0)).unwrap();
        assert_eq!(empty.count, 0);
        assert_eq!(empty.mean, None);
        assert_eq!(empty.median, None);
        assert_eq!(empty.min, None);
        assert_eq!(empty.max, None);
        assert_eq!(empty.std, None);
    }

    #[test]
    fn test_aggregate_population_std() {
        let readings = vec![reading(10, 10, 10.0), reading(10, 20, 14.0)];
        let series = ReferenceSeries::aggregate(&readings, at(10, 0), at(11, 0));
        let bucket = series.at(at(10, 0)).unwrap();
        // population std of {10, 14} is 2, sample std would be ~2.83
        assert!((bucket.std.unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_aligned_view_shifts_half_hour() {
        let readings = vec![reading(10, 15, 20.0)];
        let series = ReferenceSeries::aggregate(&readings, at(10, 0), at(11, 0));
        let aligned = series.aligned();
        assert!(aligned.at(at(10, 0)).is_none());
        let shifted = aligned.at(at(10, 30)).unwrap();
        assert_eq!(shifted.mean, Some(20.0));
    }

    #[test]
    fn test_min_max_over_series() {
        let readings = vec![
            reading(10, 10, 12.0),
            reading(10, 20, 30.0),
            reading(11, 10, 8.0),
        ];
        let series = ReferenceSeries::aggregate(&readings, at(10, 0), at(12, 0));
        assert_eq!(series.min_temperature(), Some(8.0));
        assert_eq!(series.max_temperature(), Some(30.0));
    }
}
