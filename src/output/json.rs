//! JSON result documents.
//!
//! One document per analyzed recording, holding the detections together
//! with the settings that produced them and a small summary block.

use crate::detect::Detection;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Top-level JSON result document.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonResultFile {
    /// Name of the analyzed audio file.
    pub source_file: String,
    /// When the analysis ran.
    pub analysis_date: DateTime<Utc>,
    /// Model the detections came from.
    pub model: String,
    /// Settings in effect for this analysis.
    pub settings: JsonSettings,
    /// Detections ordered by start time.
    pub detections: Vec<JsonDetection>,
    /// Summary block.
    pub summary: JsonSummary,
}

/// Analysis settings echoed into the result document.
///
/// Location fields are omitted from the output when occurrence filtering
/// was not in effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSettings {
    /// Detection confidence threshold.
    pub min_confidence: f32,
    /// Window overlap in seconds.
    pub overlap: f32,
    /// Recording latitude.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Recording longitude.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Week of the year used for the occurrence model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week: Option<u32>,
}

/// One detection as serialized into the document.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDetection {
    /// Start offset in seconds.
    pub start_time: f32,
    /// End offset in seconds.
    pub end_time: f32,
    /// Scientific name.
    pub scientific_name: String,
    /// Common name.
    pub common_name: String,
    /// Confidence score.
    pub confidence: f32,
}

impl From<&Detection> for JsonDetection {
    fn from(detection: &Detection) -> Self {
        Self {
            start_time: detection.start_time,
            end_time: detection.end_time,
            scientific_name: detection.scientific_name.clone(),
            common_name: detection.common_name.clone(),
            confidence: detection.confidence,
        }
    }
}

/// Per-recording summary statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSummary {
    /// Total number of detections.
    pub total_detections: usize,
    /// Number of unique species.
    pub unique_species: usize,
    /// Audio duration in seconds.
    pub audio_duration_seconds: f32,
}

/// Writer that buffers detections and emits the whole document at
/// `finalize`.
pub struct JsonResultWriter {
    detections: Vec<JsonDetection>,
    output_path: PathBuf,
    source_file: String,
    model: String,
    settings: JsonSettings,
    audio_duration: f32,
}

impl JsonResultWriter {
    /// Create a JSON result writer. Nothing touches the filesystem until
    /// `finalize`.
    pub fn new(
        output_path: &Path,
        source_file: &str,
        audio_duration: f32,
        model: &str,
        settings: JsonSettings,
    ) -> Self {
        Self {
            detections: Vec::new(),
            output_path: output_path.to_path_buf(),
            source_file: source_file.to_string(),
            model: model.to_string(),
            settings,
            audio_duration,
        }
    }

    fn build_document(&mut self) -> JsonResultFile {
        let unique: HashSet<&str> = self
            .detections
            .iter()
            .map(|d| d.scientific_name.as_str())
            .collect();
        let summary = JsonSummary {
            total_detections: self.detections.len(),
            unique_species: unique.len(),
            audio_duration_seconds: self.audio_duration,
        };

        JsonResultFile {
            source_file: self.source_file.clone(),
            analysis_date: Utc::now(),
            model: self.model.clone(),
            settings: self.settings.clone(),
            detections: std::mem::take(&mut self.detections),
            summary,
        }
    }
}

impl OutputWriter for JsonResultWriter {
    fn write_detection(&mut self, detection: &Detection) -> Result<()> {
        self.detections.push(detection.into());
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        let document = self.build_document();
        let file = BufWriter::new(File::create(&self.output_path)?);
        serde_json::to_writer_pretty(file, &document).map_err(|e| Error::JsonWrite {
            path: self.output_path.clone(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn settings() -> JsonSettings {
        JsonSettings {
            min_confidence: 0.1,
            overlap: 0.0,
            lat: None,
            lon: None,
            week: None,
        }
    }

    fn read_back(path: &Path) -> JsonResultFile {
        let content = std::fs::read_to_string(path).expect("read file");
        serde_json::from_str(&content).expect("parse JSON")
    }

    #[test]
    fn test_json_writer_basic() {
        let dir = tempdir().expect("create temp dir");
        let output_path = dir.path().join("test.avescan.json");

        let mut writer =
            JsonResultWriter::new(&output_path, "test.wav", 60.0, "birdnet-v24", settings());
        let detection =
            Detection::from_label("Passer domesticus_House Sparrow", 0.95, 0.0, 3.0);
        writer.write_detection(&detection).expect("write detection");
        writer.finalize().expect("finalize");

        let result = read_back(&output_path);
        assert_eq!(result.source_file, "test.wav");
        assert_eq!(result.model, "birdnet-v24");
        assert_eq!(result.detections.len(), 1);
        assert_eq!(result.detections[0].scientific_name, "Passer domesticus");
        assert_eq!(result.summary.total_detections, 1);
        assert!((result.summary.audio_duration_seconds - 60.0).abs() < 0.001);
    }

    #[test]
    fn test_json_summary_unique_species() {
        let dir = tempdir().expect("create temp dir");
        let output_path = dir.path().join("test.avescan.json");

        let mut writer = JsonResultWriter::new(
            &output_path,
            "test.wav",
            60.0,
            "birdnet-v24",
            JsonSettings {
                lat: Some(45.0),
                lon: Some(-73.0),
                week: Some(24),
                ..settings()
            },
        );
        for (label, conf, start) in [
            ("Passer domesticus_House Sparrow", 0.95, 0.0),
            ("Turdus migratorius_American Robin", 0.87, 15.0),
            ("Passer domesticus_House Sparrow", 0.92, 30.0),
        ] {
            let d = Detection::from_label(label, conf, start, start + 3.0);
            writer.write_detection(&d).expect("write detection");
        }
        writer.finalize().expect("finalize");

        let result = read_back(&output_path);
        assert_eq!(result.summary.total_detections, 3);
        assert_eq!(result.summary.unique_species, 2);
        assert_eq!(result.settings.lat, Some(45.0));
    }
}
