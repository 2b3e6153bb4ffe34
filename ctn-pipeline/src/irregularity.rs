//! Irregularity filter: enforce a minimum one-hour cadence per sensor.

use chrono::TimeDelta;
use ctn_core::reading::Reading;

/// Minimum gap between consecutive retained readings of one sensor.
pub const MIN_GAP_HOURS: i64 = 1;

/// Per sensor: drop exact-duplicate timestamps (first occurrence wins),
/// sort ascending, then drop any reading less than one hour after the
/// previous retained reading. A sensor's first reading is never dropped.
pub fn enforce_minimum_cadence(readings: &[Reading]) -> Vec<Reading> {
    let min_gap = TimeDelta::try_hours(MIN_GAP_HOURS).unwrap();
    let mut retained = Vec::new();
    for module_id in Reading::module_ids(readings) {
        let mut series = Reading::sensor_series(readings, &module_id);
        // stable sort, so the first occurrence of a duplicate label leads
        series.sort();
        series.dedup_by(|a, b| a.time == b.time);

        let mut last_kept: Option<chrono::NaiveDateTime> = None;
        for reading in series {
            let keep = match last_kept {
                None => true,
                Some(previous) => reading.time - previous >= min_gap,
            };
            if keep {
                last_kept = Some(reading.time);
                retained.push(reading);
            }
        }
    }
    log::info!(
        "irregularity filter: kept {} of {} readings",
        retained.len(),
        readings.len()
    );
    retained
}

#[cfg(test)]
mod tests {
    use super::enforce_minimum_cadence;
    use crate::fixtures::{at, reading};
    use chrono::TimeDelta;

    #[test]
    fn test_duplicates_keep_first() {
        let readings = vec![
            reading("a", at(1, 0, 0), 20.0),
            reading("a", at(1, 0, 0), 99.0),
            reading("a", at(1, 1, 0), 21.0),
        ];
        let retained = enforce_minimum_cadence(&readings);
        assert_eq!(retained.len(), 2);
        assert_eq!(retained[0].temperature, 20.0);
    }

    #[test]
    fn test_sub_hour_gaps_dropped_against_retained() {
        // 00:00 kept, 00:30 dropped (30m after 00:00), 00:59 dropped
        // (still under an hour after the retained 00:00), 01:00 kept.
        let readings = vec![
            reading("a", at(1, 0, 0), 1.0),
            reading("a", at(1, 0, 30), 2.0),
            reading("a", at(1, 0, 59), 3.0),
            reading("a", at(1, 1, 0), 4.0),
        ];
        let retained = enforce_minimum_cadence(&readings);
        let temps: Vec<f64> = retained.iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![1.0, 4.0]);
    }

    #[test]
    fn test_output_strictly_increasing_with_hourly_gaps() {
        let readings = vec![
            reading("a", at(1, 3, 15), 1.0),
            reading("a", at(1, 0, 0), 2.0),
            reading("a", at(1, 0, 20), 3.0),
            reading("a", at(1, 1, 5), 4.0),
            reading("a", at(1, 1, 5), 5.0),
            reading("a", at(1, 2, 40), 6.0),
        ];
        let retained = enforce_minimum_cadence(&readings);
        for pair in retained.windows(2) {
            let gap = pair[1].time - pair[0].time;
            assert!(gap >= TimeDelta::try_hours(1).unwrap());
            assert!(pair[1].time > pair[0].time);
        }
    }

    #[test]
    fn test_first_reading_never_dropped() {
        let readings = vec![reading("a", at(1, 0, 17), 20.0)];
        let retained = enforce_minimum_cadence(&readings);
        assert_eq!(retained.len(), 1);
    }
}
