//! Merging per-window scores into deduplicated detections.

use crate::detect::{Detection, WindowScores};
use std::collections::HashMap;

/// Tolerance when comparing window time offsets.
const GAP_EPSILON: f32 = 1e-4;

/// Merge per-window scores into a time-ordered, confidence-filtered list of
/// detections.
///
/// For each species, windows scoring at or above `min_confidence` form runs.
/// A window joins the current run when its range overlaps the run or starts
/// no more than one full `step_secs` after the run ends; a single
/// below-threshold window between two passing windows therefore does not
/// split a run. Each run becomes one [`Detection`] spanning the run's full
/// time range with the maximum confidence observed, so a brief strong
/// vocalization is not diluted by adjacent quieter windows.
///
/// End times are clamped to `duration_secs` (the final window may be
/// zero-padded past the end of the recording). Output is ordered by start
/// time, then descending confidence; no two detections share a species and
/// start time. With `min_confidence` of 0 every scored window passes
/// through, which is useful for completeness audits.
pub fn aggregate(
    windows: &[WindowScores],
    min_confidence: f32,
    step_secs: f32,
    duration_secs: f32,
) -> Vec<Detection> {
    // Passing windows per species, in window order
    let mut hits: HashMap<&str, Vec<(f32, f32, f32)>> = HashMap::new();
    for window in windows {
        for score in &window.scores {
            if score.confidence >= min_confidence {
                hits.entry(score.label.as_str()).or_default().push((
                    window.start_time,
                    window.end_time,
                    score.confidence,
                ));
            }
        }
    }

    let mut detections = Vec::new();
    for (label, mut spans) in hits {
        spans.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut run: Option<(f32, f32, f32)> = None;
        for (start, end, confidence) in spans {
            run = Some(match run {
                Some((run_start, run_end, run_conf))
                    if start <= run_end + step_secs + GAP_EPSILON =>
                {
                    (run_start, run_end.max(end), run_conf.max(confidence))
                }
                Some(finished) => {
                    detections.push(finish_run(label, finished, duration_secs));
                    (start, end, confidence)
                }
                None => (start, end, confidence),
            });
        }
        if let Some(finished) = run {
            detections.push(finish_run(label, finished, duration_secs));
        }
    }

    // Order by start time, then by confidence (descending)
    detections.sort_by(|a, b| {
        a.start_time
            .partial_cmp(&b.start_time)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.confidence
                    .partial_cmp(&a.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });

    detections
}

fn finish_run(label: &str, (start, end, confidence): (f32, f32, f32), duration_secs: f32) -> Detection {
    let end = if duration_secs > start {
        end.min(duration_secs)
    } else {
        end
    };
    Detection::from_label(label, confidence, start, end)
}
