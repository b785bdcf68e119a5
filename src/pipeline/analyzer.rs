//! Driving a recording through segmentation, filtering, scoring and
//! aggregation.

use crate::audio::{decode_audio_file, resample, segment};
use crate::constants::{DEFAULT_MIN_CONFIDENCE, DEFAULT_OVERLAP};
use crate::detect::{Detection, DetectionScorer, OccurrenceFilter, WindowScores, aggregate};
use crate::error::{Error, Result};
use crate::model::SpeciesModel;
use crate::pipeline::{AnalysisState, Recording, RecordingSource};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Options shared by every recording analyzed by one pipeline.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Minimum confidence for a detection (0.0-1.0).
    pub min_confidence: f32,
    /// Window overlap in seconds.
    pub overlap_secs: f32,
    /// Default latitude for recordings without one.
    pub lat: Option<f64>,
    /// Default longitude for recordings without one.
    pub lon: Option<f64>,
    /// Default recording date for recordings without one.
    pub date: Option<NaiveDate>,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            overlap_secs: DEFAULT_OVERLAP,
            lat: None,
            lon: None,
            date: None,
        }
    }
}

/// Analysis pipeline shared across recordings.
///
/// Holds the classifier and the occurrence filter (with its cache) for the
/// whole run; individual recordings flow through [`Self::analyze`].
pub struct RecordingPipeline {
    model: Arc<dyn SpeciesModel>,
    occurrence: OccurrenceFilter,
    options: AnalyzeOptions,
}

impl RecordingPipeline {
    /// Create a pipeline over the given classifier and occurrence filter.
    pub fn new(
        model: Arc<dyn SpeciesModel>,
        occurrence: OccurrenceFilter,
        options: AnalyzeOptions,
    ) -> Self {
        Self {
            model,
            occurrence,
            options,
        }
    }

    /// The classifier's native sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.model.sample_rate()
    }

    /// Analyze a recording in place.
    ///
    /// On success the recording is `Complete` and its detections are
    /// available; on failure it is `Failed` and the error is returned wrapped
    /// as a pipeline error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyAnalyzed`] when called on a recording that has
    /// left the `Created` state, and [`Error::Pipeline`] wrapping the stage
    /// failure otherwise.
    pub fn analyze(&self, recording: &mut Recording) -> Result<()> {
        if recording.state() != AnalysisState::Created {
            return Err(Error::AlreadyAnalyzed);
        }

        let start_time = Instant::now();
        match self.run_stages(recording) {
            Ok(()) => {
                debug!(
                    "Analysis finished in {:.2}s",
                    start_time.elapsed().as_secs_f64()
                );
                Ok(())
            }
            Err(e) => {
                recording.fail(&e);
                Err(e.into_pipeline())
            }
        }
    }

    fn run_stages(&self, recording: &mut Recording) -> Result<()> {
        recording.set_state(AnalysisState::Segmenting);
        let samples = self.prepare_samples(recording)?;

        let target_rate = self.model.sample_rate();
        #[allow(clippy::cast_precision_loss)]
        let duration_secs = samples.len() as f32 / target_rate as f32;
        recording.set_duration(duration_secs);

        let window_secs = self.model.window_secs();
        let overlap_secs = self.options.overlap_secs;
        debug!("Segmenting into {window_secs:.1}s windows with {overlap_secs:.1}s overlap");
        let windows = segment(&samples, target_rate, window_secs, overlap_secs)?;

        recording.set_state(AnalysisState::Filtering);
        let (lat, lon) = recording
            .location()
            .map_or((self.options.lat, self.options.lon), |(lat, lon)| {
                (Some(lat), Some(lon))
            });
        let date = recording.date().or(self.options.date);
        let allowed = self.occurrence.restrict(lat, lon, date);

        recording.set_state(AnalysisState::Scoring);
        let scorer = DetectionScorer::new(self.model.as_ref());
        let mut scored = Vec::with_capacity(windows.len());
        for window in &windows {
            match scorer.score(window, &allowed) {
                Ok(scores) => scored.push(WindowScores {
                    start_time: window.start_time,
                    end_time: window.end_time,
                    scores,
                }),
                Err(Error::InvalidWindow { expected, actual }) => {
                    warn!(
                        "Skipping window at {:.1}s: {actual} samples, classifier needs {expected}",
                        window.start_time
                    );
                }
                Err(e) => return Err(e),
            }
        }

        recording.set_state(AnalysisState::Aggregating);
        let min_confidence = recording
            .min_confidence()
            .unwrap_or(self.options.min_confidence);
        let step_secs = window_secs - overlap_secs;
        let detections = aggregate(&scored, min_confidence, step_secs, duration_secs);

        info!(
            "Found {} detections above {:.1}% confidence",
            detections.len(),
            min_confidence * 100.0
        );
        recording.complete(detections);
        Ok(())
    }

    /// Decode (if file-backed) and resample to the classifier's rate.
    fn prepare_samples(&self, recording: &Recording) -> Result<Vec<f32>> {
        let (samples, source_rate) = match recording.source() {
            RecordingSource::Path(path) => {
                info!("Decoding: {}", path.display());
                let decoded = decode_audio_file(path)?;
                (decoded.samples, decoded.sample_rate)
            }
            RecordingSource::Buffer {
                samples,
                sample_rate,
            } => (samples.clone(), *sample_rate),
        };

        let target_rate = self.model.sample_rate();
        if source_rate == target_rate {
            Ok(samples)
        } else {
            debug!("Resampling from {source_rate} Hz to {target_rate} Hz");
            resample(samples, source_rate, target_rate)
        }
    }

    /// Analyze a file path directly, returning its detections.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pipeline`] when any stage fails.
    pub fn analyze_path(&self, path: &Path) -> Result<Vec<Detection>> {
        let mut recording = Recording::from_path(path);
        self.analyze(&mut recording)?;
        recording.detections().map(<[Detection]>::to_vec)
    }
}

/// Collect audio files from input paths (files and directories).
///
/// # Errors
///
/// Returns an I/O error when a directory cannot be read.
pub fn collect_input_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_audio_file(path) {
                files.push(path.clone());
            }
        } else if path.is_dir() {
            collect_audio_files_recursive(path, &mut files)?;
        } else {
            warn!("Skipping non-existent path: {}", path.display());
        }
    }

    Ok(files)
}

fn collect_audio_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            collect_audio_files_recursive(&path, files)?;
        } else if is_audio_file(&path) {
            files.push(path);
        }
    }

    Ok(())
}

/// Check if a file has a supported audio extension.
pub fn is_audio_file(path: &Path) -> bool {
    use std::ffi::OsStr;

    path.extension().is_some_and(|ext| {
        // Compare as OsStr to handle non-UTF-8 filenames
        ext.eq_ignore_ascii_case(OsStr::new("wav"))
            || ext.eq_ignore_ascii_case(OsStr::new("flac"))
            || ext.eq_ignore_ascii_case(OsStr::new("mp3"))
            || ext.eq_ignore_ascii_case(OsStr::new("m4a"))
            || ext.eq_ignore_ascii_case(OsStr::new("aac"))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::detect::SpeciesScore;

    /// Classifier stub scoring every full window with a fixed confidence.
    struct StubModel {
        labels: Vec<String>,
        confidence: f32,
    }

    impl StubModel {
        fn new(confidence: f32) -> Self {
            Self {
                labels: vec!["Parus major_Great Tit".to_string()],
                confidence,
            }
        }
    }

    impl SpeciesModel for StubModel {
        fn labels(&self) -> &[String] {
            &self.labels
        }

        fn sample_rate(&self) -> u32 {
            48_000
        }

        fn window_secs(&self) -> f32 {
            3.0
        }

        fn input_len(&self) -> usize {
            144_000
        }

        fn score_window(&self, _samples: &[f32]) -> Result<Vec<SpeciesScore>> {
            Ok(vec![SpeciesScore {
                label: self.labels[0].clone(),
                confidence: self.confidence,
            }])
        }
    }

    fn pipeline(confidence: f32) -> RecordingPipeline {
        RecordingPipeline::new(
            Arc::new(StubModel::new(confidence)),
            OccurrenceFilter::universal(),
            AnalyzeOptions::default(),
        )
    }

    #[test]
    fn test_analyze_buffer_produces_detections() {
        let pipeline = pipeline(0.8);
        // 9 seconds at the model rate: three full windows
        let mut recording = Recording::from_buffer(vec![0.1; 432_000], 48_000);

        pipeline.analyze(&mut recording).unwrap();

        assert_eq!(recording.state(), AnalysisState::Complete);
        let detections = recording.detections().unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].start_time, 0.0);
        assert_eq!(detections[0].end_time, 9.0);
        assert_eq!(detections[0].confidence, 0.8);
    }

    #[test]
    fn test_analyze_below_threshold_is_empty_but_complete() {
        let pipeline = pipeline(0.05);
        let mut recording = Recording::from_buffer(vec![0.1; 144_000], 48_000);

        pipeline.analyze(&mut recording).unwrap();
        assert!(recording.detections().unwrap().is_empty());
    }

    #[test]
    fn test_analyze_twice_is_rejected() {
        let pipeline = pipeline(0.8);
        let mut recording = Recording::from_buffer(vec![0.1; 144_000], 48_000);

        pipeline.analyze(&mut recording).unwrap();
        assert!(matches!(
            pipeline.analyze(&mut recording),
            Err(Error::AlreadyAnalyzed)
        ));
        // First result is untouched
        assert_eq!(recording.detections().unwrap().len(), 1);
    }

    #[test]
    fn test_analyze_missing_file_fails_recording() {
        let pipeline = pipeline(0.8);
        let mut recording = Recording::from_path("/nonexistent/audio.wav");

        let result = pipeline.analyze(&mut recording);
        assert!(matches!(result, Err(Error::Pipeline { .. })));
        assert_eq!(recording.state(), AnalysisState::Failed);
    }

    #[test]
    fn test_recording_min_confidence_overrides_pipeline() {
        let pipeline = pipeline(0.3);
        let mut recording =
            Recording::from_buffer(vec![0.1; 144_000], 48_000).with_min_confidence(0.5);

        pipeline.analyze(&mut recording).unwrap();
        assert!(recording.detections().unwrap().is_empty());
    }

    #[test]
    fn test_short_buffer_is_zero_padded_not_skipped() {
        let pipeline = pipeline(0.8);
        // Half a window of audio; segmentation pads it to a full window
        let mut recording = Recording::from_buffer(vec![0.1; 72_000], 48_000);

        pipeline.analyze(&mut recording).unwrap();
        let detections = recording.detections().unwrap();
        assert_eq!(detections.len(), 1);
        // End clamped to the real audio duration
        assert_eq!(detections[0].end_time, 1.5);
    }

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file(Path::new("test.wav")));
        assert!(is_audio_file(Path::new("test.FLAC")));
        assert!(is_audio_file(Path::new("ääni_tiedostö.mp3")));
        assert!(!is_audio_file(Path::new("test.txt")));
        assert!(!is_audio_file(Path::new("noextension")));
    }
}
