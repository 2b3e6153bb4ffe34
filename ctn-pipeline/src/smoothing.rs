//! Local smoothing filter: trailing rolling mean per sensor to suppress
//! transient single-reading spikes.

use chrono::TimeDelta;
use ctn_core::reading::Reading;
use ctn_core::stats;

/// Width of the trailing time window, in hours.
pub const WINDOW_HOURS: i64 = 3;

/// Replace each sensor's temperatures with the mean over the trailing
/// window `(t - 3h, t]`, minimum one sample. The window is time-based, so
/// sparse series average over fewer samples. Row count never changes.
pub fn smooth_local_spikes(readings: &[Reading]) -> Vec<Reading> {
    let window = TimeDelta::try_hours(WINDOW_HOURS).unwrap();
    let mut smoothed = Vec::with_capacity(readings.len());
    for module_id in Reading::module_ids(readings) {
        let mut series = Reading::sensor_series(readings, &module_id);
        series.sort();
        let mut start = 0usize;
        for i in 0..series.len() {
            let cutoff = series[i].time - window;
            while series[start].time <= cutoff {
                start += 1;
            }
            let values: Vec<f64> = series[start..=i].iter().map(|r| r.temperature).collect();
            let mut reading = series[i].clone();
            // the window always holds at least series[i] itself
            reading.temperature = stats::mean(&values).unwrap();
            smoothed.push(reading);
        }
    }
    smoothed
}

#[cfg(test)]
mod tests {
    use super::smooth_local_spikes;
    use crate::fixtures::{at, reading};

    #[test]
    fn test_spike_suppressed() {
        let readings = vec![
            reading("a", at(1, 0, 0), 20.0),
            reading("a", at(1, 1, 0), 20.0),
            reading("a", at(1, 2, 0), 50.0),
            reading("a", at(1, 3, 0), 20.0),
        ];
        let smoothed = smooth_local_spikes(&readings);
        assert_eq!(smoothed.len(), 4);
        // the spike at 02:00 averages with the two readings before it
        assert_eq!(smoothed[2].temperature, 30.0);
        // 03:00 window is (00:00, 03:00]: readings at 01:00, 02:00, 03:00
        assert_eq!(smoothed[3].temperature, 30.0);
    }

    #[test]
    fn test_sparse_series_uses_available_samples() {
        let readings = vec![
            reading("a", at(1, 0, 0), 10.0),
            reading("a", at(1, 12, 0), 30.0), // 12h gap, alone in its window
        ];
        let smoothed = smooth_local_spikes(&readings);
        assert_eq!(smoothed[0].temperature, 10.0);
        assert_eq!(smoothed[1].temperature, 30.0);
    }

    #[test]
    fn test_row_count_preserved_across_sensors() {
        let readings = vec![
            reading("a", at(1, 0, 0), 10.0),
            reading("b", at(1, 0, 0), 12.0),
            reading("a", at(1, 1, 0), 14.0),
        ];
        let smoothed = smooth_local_spikes(&readings);
        assert_eq!(smoothed.len(), 3);
    }

    #[test]
    fn test_unsorted_input_sorted_per_sensor() {
        let readings = vec![
            reading("a", at(1, 2, 0), 40.0),
            reading("a", at(1, 0, 0), 10.0),
            reading("a", at(1, 1, 0), 20.0),
        ];
        let smoothed = smooth_local_spikes(&readings);
        let temps: Vec<f64> = smoothed.iter().map(|r| r.temperature).collect();
        // sorted to 10, 20, 40; trailing means 10, 15, (10+20+40)/3
        assert_eq!(temps[0], 10.0);
        assert_eq!(temps[1], 15.0);
        assert!((temps[2] - 70.0 / 3.0).abs() < 1e-12);
    }
}
