//! Configuration type definitions.

use crate::constants::occurrence::DEFAULT_THRESHOLD;
use crate::constants::{DEFAULT_MIN_CONFIDENCE, DEFAULT_OVERLAP, watch};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configured models by name.
    #[serde(default)]
    pub models: HashMap<String, ModelConfig>,

    /// Default settings.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Inference settings.
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Directory watch settings.
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Configuration for a single model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the ONNX classifier file.
    pub path: PathBuf,

    /// Path to the labels file.
    pub labels: PathBuf,

    /// Optional occurrence meta model for location-based filtering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_model: Option<PathBuf>,
}

/// Default analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Default model name to use.
    pub model: Option<String>,

    /// Minimum confidence threshold.
    pub min_confidence: f32,

    /// Window overlap in seconds.
    pub overlap: f32,

    /// Output formats.
    pub formats: Vec<OutputFormat>,

    /// Default recording latitude.
    pub latitude: Option<f64>,

    /// Default recording longitude.
    pub longitude: Option<f64>,

    /// Occurrence score threshold for the location filter.
    pub occurrence_threshold: f32,

    /// Static species list file restricting detections.
    pub species_list: Option<PathBuf>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model: None,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            overlap: DEFAULT_OVERLAP,
            formats: vec![OutputFormat::Csv],
            latitude: None,
            longitude: None,
            occurrence_threshold: DEFAULT_THRESHOLD,
            species_list: None,
        }
    }
}

/// Inference device configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InferenceDevice {
    /// Automatically select (GPU if available, else CPU).
    #[default]
    Auto,
    /// Force GPU (CUDA), fail if unavailable.
    Gpu,
    /// Force CPU inference.
    Cpu,
}

/// Inference settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Device to use for inference.
    pub device: InferenceDevice,
}

/// Directory watch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Seconds between directory rescans.
    pub poll_interval_secs: u64,

    /// Seconds a file must stay unchanged before analysis.
    pub debounce_secs: u64,

    /// Concurrent analysis workers.
    pub workers: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: watch::DEFAULT_POLL_INTERVAL.as_secs(),
            debounce_secs: watch::DEFAULT_DEBOUNCE.as_secs(),
            workers: watch::DEFAULT_WORKERS,
        }
    }
}

impl WatchConfig {
    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Debounce as a [`Duration`].
    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Generic CSV format.
    Csv,
    /// JSON result document.
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("csv".parse::<OutputFormat>().ok(), Some(OutputFormat::Csv));
        assert_eq!(
            "JSON".parse::<OutputFormat>().ok(),
            Some(OutputFormat::Json)
        );
        assert!("unknown".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_defaults_config_default_values() {
        let defaults = DefaultsConfig::default();
        assert_eq!(defaults.min_confidence, 0.1);
        assert_eq!(defaults.overlap, 0.0);
        assert_eq!(defaults.occurrence_threshold, 0.03);
        assert!(defaults.latitude.is_none());
    }

    #[test]
    fn test_watch_config_durations() {
        let watch = WatchConfig::default();
        assert!(watch.poll_interval() >= Duration::from_secs(1));
        assert!(watch.debounce() >= watch.poll_interval());
    }
}
