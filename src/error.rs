//! Error types for avescan.

/// Result type alias for avescan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for avescan.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Invalid analysis parameters, raised before any processing begins.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// Description of the invalid parameter.
        message: String,
    },

    /// Model not found in configuration.
    #[error("model '{name}' not found in configuration")]
    ModelNotFound {
        /// Name of the missing model.
        name: String,
    },

    /// Model file does not exist.
    #[error("model file does not exist: {path}")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: std::path::PathBuf,
    },

    /// Labels file does not exist.
    #[error("labels file does not exist: {path}")]
    LabelsFileNotFound {
        /// Path to the missing labels file.
        path: std::path::PathBuf,
    },

    /// Classifier or occurrence model could not be loaded.
    ///
    /// Fatal for the classifier; the occurrence filter falls back to the
    /// universal species set instead of surfacing this error.
    #[error("model unavailable: {reason}")]
    ModelUnavailable {
        /// Description of the load failure.
        reason: String,
    },

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// Occurrence model prediction failed.
    #[error("failed to predict occurrence scores: {reason}")]
    OccurrencePredict {
        /// Description of the prediction failure.
        reason: String,
    },

    /// Occurrence filtering requires a meta model.
    #[error("occurrence filtering requires a meta model (model {model_name} has none configured)")]
    MetaModelMissing {
        /// Name of the model.
        model_name: String,
    },

    /// A window was shorter than the model's required input length.
    ///
    /// Recovered locally: the pipeline skips the window and continues.
    #[error("invalid analysis window: expected {expected} samples, got {actual}")]
    InvalidWindow {
        /// Required sample count.
        expected: usize,
        /// Actual sample count.
        actual: usize,
    },

    /// A recording's analysis failed; other recordings are unaffected.
    #[error("recording analysis failed: {source}")]
    Pipeline {
        /// The originating error.
        #[source]
        source: Box<Error>,
    },

    /// Analysis has not been run on this recording yet.
    #[error("recording has not been analyzed (call analyze() first)")]
    NotAnalyzed,

    /// Recording instances cannot be re-analyzed.
    #[error("recording has already been analyzed (construct a fresh Recording to re-run)")]
    AlreadyAnalyzed,

    /// No valid audio files found.
    #[error("no valid audio files found in the provided paths")]
    NoValidAudioFiles,

    /// Failed to open audio file.
    #[error("failed to open audio file '{path}'")]
    AudioOpen {
        /// Path to the audio file.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to decode audio.
    #[error("failed to decode audio from '{path}'")]
    AudioDecode {
        /// Path to the audio file.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No audio tracks found.
    #[error("no audio tracks found in '{path}'")]
    NoAudioTracks {
        /// Path to the audio file.
        path: std::path::PathBuf,
    },

    /// Failed to resample audio.
    #[error("failed to resample audio: {reason}")]
    Resample {
        /// Description of the resampling failure.
        reason: String,
    },

    /// Invalid latitude value.
    #[error("invalid latitude: {value} (must be -90.0 to 90.0)")]
    InvalidLatitude {
        /// Invalid latitude value.
        value: f64,
    },

    /// Invalid longitude value.
    #[error("invalid longitude: {value} (must be -180.0 to 180.0)")]
    InvalidLongitude {
        /// Invalid longitude value.
        value: f64,
    },

    /// Failed to read species list file.
    #[error("failed to read species list file '{path}'")]
    SpeciesListRead {
        /// Path to the species list file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write CSV output.
    #[error("CSV output error")]
    Csv(#[from] csv::Error),

    /// Failed to write JSON output file.
    #[error("failed to write JSON output file '{path}'")]
    JsonWrite {
        /// Path to the JSON file.
        path: std::path::PathBuf,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Wrap an error as a per-recording pipeline failure.
    pub fn into_pipeline(self) -> Self {
        match self {
            Self::Pipeline { .. } => self,
            other => Self::Pipeline {
                source: Box::new(other),
            },
        }
    }
}
