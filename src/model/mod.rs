//! Opaque model interfaces and their `birdnet-onnx` implementations.
//!
//! The pipeline never depends on model internals: the classifier and the
//! occurrence (range) model are consumed through the [`SpeciesModel`] and
//! [`OccurrenceModel`] traits, so any compatible scorer can substitute.

mod classifier;
mod occurrence_model;

pub use classifier::OnnxClassifier;
pub use occurrence_model::OnnxOccurrenceModel;

use crate::detect::SpeciesScore;
use crate::error::Result;

/// A species classifier consumed as an opaque scorer.
///
/// Implementations must be safe for concurrent inference calls; the loaded
/// model is shared read-only across watch queue workers.
pub trait SpeciesModel: Send + Sync {
    /// Species labels in `ScientificName_CommonName` format.
    fn labels(&self) -> &[String];

    /// Sample rate the model expects, in Hz.
    fn sample_rate(&self) -> u32;

    /// Analysis window length the model expects, in seconds.
    fn window_secs(&self) -> f32;

    /// Required sample count per window.
    fn input_len(&self) -> usize;

    /// Score one window of audio, returning per-species confidences ordered
    /// by descending confidence.
    fn score_window(&self, samples: &[f32]) -> Result<Vec<SpeciesScore>>;
}

/// A location/season occurrence model consumed as an opaque scorer.
pub trait OccurrenceModel: Send + Sync {
    /// Predict per-species occurrence scores for a location and `BirdNET`
    /// week (1-48).
    fn predict_week(&self, lat: f64, lon: f64, week: u32) -> Result<Vec<(String, f32)>>;
}
