//! Detection type definitions.

/// A (species, confidence) pair produced for one window.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesScore {
    /// Species label in `ScientificName_CommonName` format.
    pub label: String,
    /// Confidence in [0.0, 1.0].
    pub confidence: f32,
}

/// Scored output for one analysis window, keyed by its time range.
#[derive(Debug, Clone)]
pub struct WindowScores {
    /// Window start time in seconds.
    pub start_time: f32,
    /// Window end time in seconds.
    pub end_time: f32,
    /// Per-species scores, ordered by descending confidence.
    pub scores: Vec<SpeciesScore>,
}

/// A single species detection, the externally visible unit of output.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Detection start time in seconds, relative to the recording start.
    pub start_time: f32,
    /// Detection end time in seconds.
    pub end_time: f32,
    /// Scientific name of the species.
    pub scientific_name: String,
    /// Common name of the species.
    pub common_name: String,
    /// Detection confidence (0.0 - 1.0).
    pub confidence: f32,
}

impl Detection {
    /// Parse a species label in `BirdNET` format.
    ///
    /// `BirdNET` labels are formatted as `ScientificName_CommonName`.
    pub fn from_label(label: &str, confidence: f32, start_time: f32, end_time: f32) -> Self {
        let (scientific_name, common_name) = label.find('_').map_or_else(
            || (label.to_string(), label.to_string()),
            |idx| (label[..idx].to_string(), label[idx + 1..].to_string()),
        );

        Self {
            start_time,
            end_time,
            scientific_name,
            common_name,
            confidence,
        }
    }

    /// Rebuild the `ScientificName_CommonName` label.
    pub fn label(&self) -> String {
        format!("{}_{}", self.scientific_name, self.common_name)
    }
}
