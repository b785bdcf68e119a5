//! Recording instances and their analysis lifecycle.

use crate::detect::Detection;
use crate::error::{Error, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Where a recording's audio comes from.
#[derive(Debug, Clone)]
pub enum RecordingSource {
    /// An audio file on disk.
    Path(PathBuf),
    /// An in-memory sample buffer.
    Buffer {
        /// Mono f32 samples.
        samples: Vec<f32>,
        /// Sample rate in Hz.
        sample_rate: u32,
    },
}

/// Pipeline state for one recording.
///
/// Transitions are strictly sequential; a recording cannot be re-analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    /// Constructed, analysis not started.
    Created,
    /// Decoding and windowing the audio.
    Segmenting,
    /// Computing the occurrence restriction.
    Filtering,
    /// Running the classifier over windows.
    Scoring,
    /// Merging window scores into detections.
    Aggregating,
    /// Analysis finished; results available.
    Complete,
    /// Analysis failed; the error is recorded.
    Failed,
}

/// One audio source queued for analysis.
///
/// Carries optional location, date and a per-recording confidence override.
/// Immutable once analysis starts; construct a fresh `Recording` to re-run.
#[derive(Debug)]
pub struct Recording {
    source: RecordingSource,
    lat: Option<f64>,
    lon: Option<f64>,
    date: Option<NaiveDate>,
    min_confidence: Option<f32>,
    state: AnalysisState,
    detections: Vec<Detection>,
    duration_secs: f32,
    error: Option<String>,
}

impl Recording {
    /// Create a recording backed by an audio file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(RecordingSource::Path(path.into()))
    }

    /// Create a recording backed by an in-memory sample buffer.
    pub fn from_buffer(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(RecordingSource::Buffer {
            samples,
            sample_rate,
        })
    }

    fn new(source: RecordingSource) -> Self {
        Self {
            source,
            lat: None,
            lon: None,
            date: None,
            min_confidence: None,
            state: AnalysisState::Created,
            detections: Vec::new(),
            duration_secs: 0.0,
            error: None,
        }
    }

    /// Attach a recording location (used for occurrence filtering).
    pub fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self
    }

    /// Attach a recording date (used for occurrence filtering).
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Override the pipeline's minimum confidence for this recording.
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = Some(min_confidence);
        self
    }

    /// The audio source.
    pub fn source(&self) -> &RecordingSource {
        &self.source
    }

    /// Source path, for file-backed recordings.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            RecordingSource::Path(path) => Some(path),
            RecordingSource::Buffer { .. } => None,
        }
    }

    /// Recording location, if any.
    pub fn location(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }

    /// Recording date, if any.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Per-recording minimum confidence override, if any.
    pub fn min_confidence(&self) -> Option<f32> {
        self.min_confidence
    }

    /// Current pipeline state.
    pub fn state(&self) -> AnalysisState {
        self.state
    }

    /// Audio duration in seconds (known once segmentation has run).
    pub fn duration_secs(&self) -> f32 {
        self.duration_secs
    }

    /// Analysis results.
    ///
    /// Idempotent after completion. A failed analysis returns the recorded
    /// failure rather than an empty result, so callers can tell "no
    /// detections" apart from "analysis failed".
    pub fn detections(&self) -> Result<&[Detection]> {
        match self.state {
            AnalysisState::Complete => Ok(&self.detections),
            AnalysisState::Failed => Err(Error::Pipeline {
                source: Box::new(Error::Internal {
                    message: self
                        .error
                        .clone()
                        .unwrap_or_else(|| "unknown analysis failure".to_string()),
                }),
            }),
            _ => Err(Error::NotAnalyzed),
        }
    }

    pub(crate) fn set_state(&mut self, state: AnalysisState) {
        self.state = state;
    }

    pub(crate) fn set_duration(&mut self, duration_secs: f32) {
        self.duration_secs = duration_secs;
    }

    pub(crate) fn complete(&mut self, detections: Vec<Detection>) {
        self.detections = detections;
        self.state = AnalysisState::Complete;
    }

    pub(crate) fn fail(&mut self, error: &Error) {
        self.error = Some(error.to_string());
        self.state = AnalysisState::Failed;
    }
}
