use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use std::mem::replace;

/// An hour range iterator that yields each hour boundary from the start
/// instant (inclusive) up to the end instant (exclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct HourRange(pub NaiveDateTime, pub NaiveDateTime);

impl Iterator for HourRange {
    type Item = NaiveDateTime;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 < self.1 {
            let next = self.0 + TimeDelta::try_hours(1).unwrap();
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }
}

/// Truncate an instant to the start of its hour.
pub fn floor_hour(t: NaiveDateTime) -> NaiveDateTime {
    t.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

/// The half-open instant bounds `[first of month 00:00, first of next month 00:00)`.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((
        start.and_hms_opt(0, 0, 0)?,
        end.and_hms_opt(0, 0, 0)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::{floor_hour, month_bounds, HourRange};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_hour_range_iteration() {
        let range = HourRange(at(2022, 1, 1, 0, 0), at(2022, 1, 1, 5, 0));
        let hours: Vec<NaiveDateTime> = range.collect();
        assert_eq!(hours.len(), 5);
        assert_eq!(hours[0], at(2022, 1, 1, 0, 0));
        assert_eq!(hours[4], at(2022, 1, 1, 4, 0));
    }

    #[test]
    fn test_hour_range_empty() {
        let range = HourRange(at(2022, 1, 1, 5, 0), at(2022, 1, 1, 5, 0));
        assert_eq!(range.count(), 0);
    }

    #[test]
    fn test_floor_hour() {
        assert_eq!(floor_hour(at(2022, 6, 1, 13, 42)), at(2022, 6, 1, 13, 0));
        assert_eq!(floor_hour(at(2022, 6, 1, 13, 0)), at(2022, 6, 1, 13, 0));
    }

    #[test]
    fn test_month_bounds_december_rolls_over() {
        let (start, end) = month_bounds(2022, 12).unwrap();
        assert_eq!(start, at(2022, 12, 1, 0, 0));
        assert_eq!(end, at(2023, 1, 1, 0, 0));
    }

    #[test]
    fn test_month_bounds_leap_february() {
        let (start, end) = month_bounds(2020, 2).unwrap();
        assert_eq!((end - start).num_days(), 29);
        let (start, end) = month_bounds(2021, 2).unwrap();
        assert_eq!((end - start).num_days(), 28);
    }
}
