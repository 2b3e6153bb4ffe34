pub mod aoi;
pub mod hour_range;
pub mod reading;
pub mod reference;
pub mod stats;
