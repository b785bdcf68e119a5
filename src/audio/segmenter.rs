//! Fixed-length analysis window segmentation with overlap support.

use crate::error::{Error, Result};

/// A fixed-length slice of audio with its time offset.
#[derive(Debug, Clone)]
pub struct Window {
    /// Audio samples, always exactly one window length (zero-padded at the
    /// end of the recording).
    pub samples: Vec<f32>,
    /// Start time in seconds.
    pub start_time: f32,
    /// End time in seconds (`start_time + window_secs`, before any clamping
    /// to the recording duration).
    pub end_time: f32,
}

/// Split audio samples into fixed-duration, optionally overlapping windows.
///
/// The final window is zero-padded to full length rather than dropped, so the
/// windows always cover the entire recording. A recording shorter than one
/// window (including an empty one) yields exactly one padded window.
///
/// # Errors
///
/// Returns [`Error::Configuration`] when `window_secs <= 0`,
/// `overlap_secs < 0`, `overlap_secs >= window_secs` or `sample_rate == 0`.
pub fn segment(
    samples: &[f32],
    sample_rate: u32,
    window_secs: f32,
    overlap_secs: f32,
) -> Result<Vec<Window>> {
    if sample_rate == 0 {
        return Err(Error::Configuration {
            message: "sample rate must be non-zero".to_string(),
        });
    }
    if window_secs <= 0.0 {
        return Err(Error::Configuration {
            message: format!("window length must be positive, got {window_secs}"),
        });
    }
    if !(0.0..window_secs).contains(&overlap_secs) {
        return Err(Error::Configuration {
            message: format!(
                "overlap must satisfy 0 <= overlap < window length, got overlap {overlap_secs} for window {window_secs}"
            ),
        });
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let window_samples = (window_secs * sample_rate as f32).round() as usize;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let overlap_samples = (overlap_secs * sample_rate as f32).round() as usize;

    let step = window_samples - overlap_samples;

    let mut windows = Vec::new();
    let mut pos = 0;

    loop {
        let end = (pos + window_samples).min(samples.len());
        let mut data = samples[pos..end].to_vec();

        // Zero-pad the trailing window to full length
        data.resize(window_samples, 0.0);

        #[allow(clippy::cast_precision_loss)]
        let start_time = pos as f32 / sample_rate as f32;

        windows.push(Window {
            samples: data,
            start_time,
            end_time: start_time + window_secs,
        });

        // This window already reached the end of the recording; a further
        // step would only produce redundant padding
        if pos + window_samples >= samples.len() {
            break;
        }
        pos += step;
    }

    Ok(windows)
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_no_overlap() {
        let samples = vec![0.0; 96_000]; // 2 seconds at 48kHz
        let windows = segment(&samples, 48_000, 1.0, 0.0).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].start_time, 0.0);
        assert_eq!(windows[1].start_time, 1.0);
    }

    #[test]
    fn test_segment_with_overlap() {
        let samples = vec![0.0; 144_000]; // 3 seconds at 48kHz
        let windows = segment(&samples, 48_000, 1.0, 0.5).unwrap();
        // With 1s windows and 0.5s overlap, step is 0.5s
        // Positions: 0.0, 0.5, 1.0, 1.5, 2.0 (the 2.0 window reaches the end)
        assert_eq!(windows.len(), 5);
        assert_eq!(windows[1].start_time, 0.5);
        assert_eq!(windows[4].start_time, 2.0);
    }

    #[test]
    fn test_segment_window_count_matches_formula() {
        // 9 seconds at 48kHz, 3s windows, 1s overlap:
        // ceil((9 - 1) / 2) = 4 windows, last starting at 6s
        let samples = vec![0.0; 432_000];
        let windows = segment(&samples, 48_000, 3.0, 1.0).unwrap();
        assert_eq!(windows.len(), 4);
        assert_eq!(windows[3].start_time, 6.0);
        assert_eq!(windows[3].end_time, 9.0);
    }

    #[test]
    fn test_segment_pads_final_window() {
        let samples = vec![0.5; 60_000]; // 1.25 seconds at 48kHz
        let windows = segment(&samples, 48_000, 1.0, 0.0).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].samples.len(), 48_000);
        // Padding is zeros past the real audio
        assert_eq!(windows[1].samples[12_000], 0.0);
    }

    #[test]
    fn test_segment_exact_duration_single_unpadded_window() {
        let samples = vec![0.25; 48_000];
        let windows = segment(&samples, 48_000, 1.0, 0.0).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].samples.len(), 48_000);
        assert_eq!(windows[0].samples[47_999], 0.25);
    }

    #[test]
    fn test_segment_empty_input_yields_one_padded_window() {
        let samples: Vec<f32> = vec![];
        let windows = segment(&samples, 48_000, 1.0, 0.0).unwrap();
        assert_eq!(windows.len(), 1);
        assert!(windows[0].samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_segment_overlap_equals_window_is_error() {
        let samples = vec![0.0; 96_000];
        let result = segment(&samples, 48_000, 1.0, 1.0);
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_segment_negative_overlap_is_error() {
        let samples = vec![0.0; 96_000];
        assert!(segment(&samples, 48_000, 1.0, -0.5).is_err());
    }

    #[test]
    fn test_segment_windows_cover_full_recording() {
        // 7.3 seconds at 48kHz, 3s windows, 1s overlap
        let samples = vec![0.0; 350_400];
        let windows = segment(&samples, 48_000, 3.0, 1.0).unwrap();

        assert_eq!(windows[0].start_time, 0.0);
        for pair in windows.windows(2) {
            // No gap between consecutive windows
            assert!(pair[1].start_time <= pair[0].end_time);
        }
        let duration = 350_400.0 / 48_000.0;
        assert!(windows.last().unwrap().end_time >= duration);
    }

    #[test]
    fn test_segment_is_repeatable() {
        let samples: Vec<f32> = (0..100_000).map(|i| (i % 7) as f32 * 0.1).collect();
        let first = segment(&samples, 48_000, 1.0, 0.25).unwrap();
        let second = segment(&samples, 48_000, 1.0, 0.25).unwrap();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.start_time, b.start_time);
            assert_eq!(a.samples, b.samples);
        }
    }
}
