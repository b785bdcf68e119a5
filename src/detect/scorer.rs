//! Per-window detection scoring.

use crate::audio::Window;
use crate::detect::{OccurrenceSet, SpeciesScore};
use crate::error::{Error, Result};
use crate::model::SpeciesModel;

/// Wraps the opaque classifier, restricting its output to an allowed
/// species set.
///
/// The classifier always produces its full score vector; disallowed species
/// are masked out afterwards. Confidences are the classifier's raw
/// probability-like outputs and are never re-normalized after masking, so
/// scores stay comparable across recordings.
pub struct DetectionScorer<'a> {
    model: &'a dyn SpeciesModel,
}

impl<'a> DetectionScorer<'a> {
    /// Create a scorer over the given classifier.
    pub fn new(model: &'a dyn SpeciesModel) -> Self {
        Self { model }
    }

    /// Score one window, returning allowed species ordered by descending
    /// confidence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWindow`] for a window shorter than the model's
    /// required input length. Callers skip the window and continue.
    pub fn score(&self, window: &Window, allowed: &OccurrenceSet) -> Result<Vec<SpeciesScore>> {
        let expected = self.model.input_len();
        if window.samples.len() < expected {
            return Err(Error::InvalidWindow {
                expected,
                actual: window.samples.len(),
            });
        }

        let mut scores = self.model.score_window(&window.samples)?;
        scores.retain(|s| allowed.contains(&s.label));
        Ok(scores)
    }
}
