//! Command implementations for the temperature network CLI.
//!
//! Provides subcommands for building the hourly virtual reference,
//! cleaning one year/month batch of crowd-sourced readings, and
//! resampling cleaned batches into period statistics.

use clap::Subcommand;
use std::path::PathBuf;

pub mod clean;
pub mod files;
pub mod reference;
pub mod resample;

#[derive(Subcommand)]
pub enum Command {
    /// Build the hourly virtual reference station from raw trusted-network readings
    Reference {
        /// Input CSV of raw reference readings (columns: time, value)
        #[arg(short = 'i', long)]
        readings_csv: PathBuf,

        /// Output path for the hourly reference statistics CSV
        #[arg(short = 'o', long)]
        out_csv: PathBuf,

        /// Year to aggregate
        #[arg(short = 'y', long)]
        year: i32,

        /// First month of the aggregation range (1-12)
        #[arg(long, default_value_t = 1)]
        start_month: u32,

        /// Last month of the aggregation range (1-12)
        #[arg(long, default_value_t = 12)]
        end_month: u32,
    },

    /// Run the full cleaning pipeline on one year/month batch
    Clean {
        /// Input CSV of crowd-sourced readings
        #[arg(short = 'i', long)]
        readings_csv: PathBuf,

        /// Hourly reference statistics CSV (output of `reference`)
        #[arg(short = 'r', long)]
        reference_csv: PathBuf,

        /// GeoJSON boundary of the area of interest; omit if the input is
        /// already clipped
        #[arg(long)]
        aoi_geojson: Option<PathBuf>,

        /// Directory for per-stage survivor and audit tables
        #[arg(short = 'o', long)]
        out_dir: PathBuf,

        /// Year of the batch
        #[arg(short = 'y', long)]
        year: i32,

        /// Month of the batch (1-12)
        #[arg(short = 'm', long)]
        month: u32,

        /// Minimum Pearson coefficient against the reference
        #[arg(long, default_value_t = ctn_pipeline::correlation::DEFAULT_CORRELATION_THRESHOLD)]
        correlation_threshold: f64,

        /// Minimum surviving fraction for a sensor to be kept
        #[arg(long, default_value_t = ctn_pipeline::reliability::DEFAULT_RELIABILITY_THRESHOLD)]
        reliability_threshold: f64,
    },

    /// Resample cleaned batches into daily/monthly/seasonal/annual statistics
    Resample {
        /// Directory holding the cleaned tables written by `clean`
        #[arg(short = 'c', long)]
        clean_dir: PathBuf,

        /// Directory for the period statistics tables
        #[arg(short = 'o', long)]
        out_dir: PathBuf,

        /// Year to resample
        #[arg(short = 'y', long)]
        year: i32,

        /// Month (required for daily and monthly granularity)
        #[arg(short = 'm', long)]
        month: Option<u32>,

        /// Aggregation granularity
        #[arg(short = 'g', long, value_enum)]
        granularity: resample::Granularity,

        /// Which cleaned stage table to resample
        #[arg(long, default_value = "filtered")]
        stage: String,
    },
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Reference {
            readings_csv,
            out_csv,
            year,
            start_month,
            end_month,
        } => reference::run_reference(&readings_csv, &out_csv, year, start_month, end_month),
        Command::Clean {
            readings_csv,
            reference_csv,
            aoi_geojson,
            out_dir,
            year,
            month,
            correlation_threshold,
            reliability_threshold,
        } => clean::run_clean(
            &readings_csv,
            &reference_csv,
            aoi_geojson.as_deref(),
            &out_dir,
            year,
            month,
            ctn_pipeline::batch::PipelineParams {
                correlation_threshold,
                reliability_threshold,
            },
        ),
        Command::Resample {
            clean_dir,
            out_dir,
            year,
            month,
            granularity,
            stage,
        } => resample::run_resample(&clean_dir, &out_dir, year, month, granularity, &stage),
    }
}
