//! Audio resampling using rubato.

use crate::error::{Error, Result};
use audioadapter_buffers::direct::SequentialSlice;
use rubato::{Fft, FixedSync, Resampler};

const CHUNK_SIZE: usize = 1024;
const CHANNELS: usize = 1;

/// Resample mono audio to the target sample rate.
///
/// Returns the input unchanged if already at the target rate.
pub fn resample(samples: Vec<f32>, from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate {
        return Ok(samples);
    }

    let mut resampler = Fft::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        CHUNK_SIZE,
        1,
        CHANNELS,
        FixedSync::Both,
    )
    .map_err(|e| Error::Resample {
        reason: e.to_string(),
    })?;

    let frames_per_chunk = resampler.input_frames_next();
    let mut output = Vec::with_capacity(estimate_output_len(samples.len(), from_rate, to_rate));

    let mut pos = 0;
    while pos + frames_per_chunk <= samples.len() {
        let resampled = process_chunk(&mut resampler, &samples[pos..pos + frames_per_chunk])?;
        output.extend_from_slice(&resampled);
        pos += frames_per_chunk;
    }

    // Trailing partial chunk: pad with zeros, then keep only the frames that
    // correspond to real input.
    if pos < samples.len() {
        let remaining = samples.len() - pos;
        let mut padded = samples[pos..].to_vec();
        padded.resize(frames_per_chunk, 0.0);

        let resampled = process_chunk(&mut resampler, &padded)?;

        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let wanted =
            (remaining as f64 * f64::from(to_rate) / f64::from(from_rate)).ceil() as usize;
        output.extend_from_slice(&resampled[..wanted.min(resampled.len())]);
    }

    Ok(output)
}

/// Push one fixed-size chunk through the resampler.
fn process_chunk(resampler: &mut Fft<f32>, chunk: &[f32]) -> Result<Vec<f32>> {
    let input = SequentialSlice::new(chunk, CHANNELS, chunk.len()).map_err(|e| Error::Resample {
        reason: format!("failed to create input adapter: {e}"),
    })?;

    let resampled = resampler
        .process(&input, 0, None)
        .map_err(|e| Error::Resample {
            reason: e.to_string(),
        })?;

    Ok(resampled.take_data())
}

/// Estimate output length after resampling.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn estimate_output_len(input_len: usize, from_rate: u32, to_rate: u32) -> usize {
    ((input_len as f64) * f64::from(to_rate) / f64::from(from_rate)).ceil() as usize + CHUNK_SIZE
}
