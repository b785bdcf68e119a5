//! Occurrence (range) model wrapper around birdnet-onnx.

use crate::error::{Error, Result};
use crate::model::OccurrenceModel;
use crate::utils::date::week_to_date;
use birdnet_onnx::RangeFilter;
use std::path::Path;

/// ONNX-backed occurrence model built from the classifier's meta model.
pub struct OnnxOccurrenceModel {
    inner: RangeFilter,
}

impl OnnxOccurrenceModel {
    /// Load the meta model, aligning its output with the classifier labels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelUnavailable`] when the meta model cannot be
    /// loaded. Callers treat this as non-fatal and fall back to the
    /// universal species set.
    pub fn load(meta_model_path: &Path, classifier_labels: &[String]) -> Result<Self> {
        let inner = RangeFilter::builder()
            .model_path(meta_model_path.to_string_lossy().to_string())
            .from_classifier_labels(classifier_labels)
            .threshold(0.0)
            .build()
            .map_err(|e| Error::ModelUnavailable {
                reason: e.to_string(),
            })?;

        Ok(Self { inner })
    }
}

impl OccurrenceModel for OnnxOccurrenceModel {
    fn predict_week(&self, lat: f64, lon: f64, week: u32) -> Result<Vec<(String, f32)>> {
        // The meta model takes a calendar date; weeks map to their starting day.
        let (month, day) = week_to_date(week);

        #[allow(clippy::cast_possible_truncation)]
        let scores = self
            .inner
            .predict(lat as f32, lon as f32, month, day)
            .map_err(|e| Error::OccurrencePredict {
                reason: e.to_string(),
            })?;

        Ok(scores
            .into_iter()
            .map(|score| (score.species, score.score))
            .collect())
    }
}
