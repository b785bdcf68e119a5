//! CLI argument definitions.

use crate::config::OutputFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Bird species detection from audio recordings.
#[derive(Debug, Parser)]
#[command(name = "avescan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Input files or directories to analyze.
    pub inputs: Vec<PathBuf>,

    /// Common options for analysis.
    #[command(flatten)]
    pub analyze: AnalyzeArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate a species list from the occurrence model.
    Species(SpeciesArgs),
    /// Watch a directory and analyze files as they appear.
    Watch(WatchArgs),
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Arguments for the species subcommand.
#[derive(Debug, Args)]
pub struct SpeciesArgs {
    /// Output file path (default: species_list.txt).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Latitude (-90.0 to 90.0).
    #[arg(long, value_parser = parse_latitude)]
    pub lat: f64,

    /// Longitude (-180.0 to 180.0).
    #[arg(long, value_parser = parse_longitude)]
    pub lon: f64,

    /// Week number (1-48).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=48),
          conflicts_with_all = ["month", "day"])]
    pub week: Option<u32>,

    /// Month (1-12).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12),
          requires = "day", conflicts_with = "week")]
    pub month: Option<u32>,

    /// Day of month (1-31).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=31),
          requires = "month", conflicts_with = "week")]
    pub day: Option<u32>,

    /// Occurrence score threshold (0.0-1.0).
    #[arg(long, value_parser = parse_confidence)]
    pub threshold: Option<f32>,

    /// Sort order for the species list.
    #[arg(long, value_enum, default_value_t = SortOrder::Freq)]
    pub sort: SortOrder,

    /// Model name from configuration.
    #[arg(short, long)]
    pub model: Option<String>,
}

/// Sort order for generated species lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    /// By occurrence probability, most likely first.
    Freq,
    /// Alphabetically by label.
    Alpha,
}

/// Arguments for the watch subcommand.
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Directory to watch.
    pub dir: PathBuf,

    /// Concurrent analysis workers.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Seconds between directory rescans.
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Seconds a file must stay unchanged before analysis.
    #[arg(long)]
    pub debounce: Option<u64>,
}

/// Arguments for the analyze command.
#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct AnalyzeArgs {
    /// Model name from configuration.
    #[arg(short, long, env = "AVESCAN_MODEL")]
    pub model: Option<String>,

    /// Path to ONNX model file (overrides config).
    #[arg(long, env = "AVESCAN_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Path to labels file (overrides config).
    #[arg(long, env = "AVESCAN_LABELS_PATH")]
    pub labels_path: Option<PathBuf>,

    /// Path to occurrence meta model (overrides config).
    #[arg(long, env = "AVESCAN_META_MODEL_PATH")]
    pub meta_model_path: Option<PathBuf>,

    /// Output formats (comma-separated: csv,json).
    #[arg(short, long, value_delimiter = ',', env = "AVESCAN_FORMAT")]
    pub format: Option<Vec<OutputFormat>>,

    /// Output directory (default: same as input).
    #[arg(short, long, env = "AVESCAN_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Minimum confidence threshold (0.0-1.0).
    #[arg(short = 'c', long, value_parser = parse_confidence, env = "AVESCAN_MIN_CONFIDENCE")]
    pub min_confidence: Option<f32>,

    /// Window overlap in seconds.
    #[arg(long, env = "AVESCAN_OVERLAP")]
    pub overlap: Option<f32>,

    /// Stop on first error.
    #[arg(long)]
    pub fail_fast: bool,

    /// Suppress informational output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Enable GPU acceleration.
    #[arg(long, conflicts_with = "cpu")]
    pub gpu: bool,

    /// Force CPU inference.
    #[arg(long, conflicts_with = "gpu")]
    pub cpu: bool,

    /// Latitude for occurrence filtering (-90.0 to 90.0).
    #[arg(long, value_parser = parse_latitude, env = "AVESCAN_LATITUDE")]
    pub lat: Option<f64>,

    /// Longitude for occurrence filtering (-180.0 to 180.0).
    #[arg(long, value_parser = parse_longitude, env = "AVESCAN_LONGITUDE")]
    pub lon: Option<f64>,

    /// Recording date for occurrence filtering (YYYY-MM-DD).
    #[arg(long, env = "AVESCAN_DATE")]
    pub date: Option<chrono::NaiveDate>,

    /// Occurrence score threshold (0.0-1.0).
    #[arg(long, value_parser = parse_confidence, env = "AVESCAN_OCCURRENCE_THRESHOLD")]
    pub occurrence_threshold: Option<f32>,

    /// Path to species list file.
    /// One species per line in `Genus species_Common Name` format.
    /// Ignored when lat/lon are provided (location filtering takes precedence).
    #[arg(long, env = "AVESCAN_SPECIES_LIST")]
    pub slist: Option<PathBuf>,
}

/// Parse and validate latitude value.
fn parse_latitude(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(-90.0..=90.0).contains(&value) {
        return Err(format!(
            "latitude must be between -90.0 and 90.0, got {value}"
        ));
    }

    Ok(value)
}

/// Parse and validate longitude value.
fn parse_longitude(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(-180.0..=180.0).contains(&value) {
        return Err(format!(
            "longitude must be between -180.0 and 180.0, got {value}"
        ));
    }

    Ok(value)
}

/// Parse and validate confidence value.
fn parse_confidence(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(0.0..=1.0).contains(&value) {
        return Err(format!(
            "confidence must be between 0.0 and 1.0, got {value}"
        ));
    }

    Ok(value)
}
