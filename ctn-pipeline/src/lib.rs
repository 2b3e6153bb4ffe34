//! Cleaning and aggregation pipeline for crowd-sourced temperature readings.
//!
//! Each stage is a pure function from a survivor set to a new survivor set;
//! stages never mutate their input. The fixed stage order for a month batch
//! lives in [`batch::clean_month`], and temporal resampling of the final
//! survivors lives in [`resample`].

pub mod audit;
pub mod batch;
pub mod bias;
pub mod correlation;
pub mod irregularity;
pub mod outlier;
pub mod range;
pub mod reliability;
pub mod resample;
pub mod smoothing;
pub mod spatial;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};
    use ctn_core::reading::Reading;

    pub fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 6, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

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
}
