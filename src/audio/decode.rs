//! Audio decoding using symphonia.

use crate::error::{Error, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded audio data.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Audio samples as mono f32 in range [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Duration in seconds.
    pub duration_secs: f32,
}

/// Decode an audio file to mono f32 samples.
///
/// Supports WAV, FLAC, MP3, and AAC formats. Multi-channel audio is mixed
/// down to mono.
pub fn decode_audio_file(path: &Path) -> Result<DecodedAudio> {
    let file = File::open(path).map_err(|e| Error::AudioOpen {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::AudioOpen {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::NoAudioTracks {
            path: path.to_path_buf(),
        })?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::AudioDecode {
            path: path.to_path_buf(),
            source: "missing sample rate".into(),
        })?;
    let channels = track
        .codec_params
        .channels
        .map_or(1, symphonia::core::audio::Channels::count);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::AudioDecode {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(Error::AudioDecode {
                    path: path.to_path_buf(),
                    source: Box::new(e),
                });
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet).map_err(|e| Error::AudioDecode {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        mix_to_mono(&decoded, channels, &mut samples);
    }

    #[allow(clippy::cast_precision_loss)]
    let duration_secs = samples.len() as f32 / sample_rate as f32;

    Ok(DecodedAudio {
        samples,
        sample_rate,
        duration_secs,
    })
}

/// Downmix a decoded buffer to mono and append it to `output`.
fn mix_to_mono(buffer: &AudioBufferRef, channels: usize, output: &mut Vec<f32>) {
    match buffer {
        AudioBufferRef::F32(buf) => {
            mix_channels(output, channels, buf.frames(), |ch, i| buf.chan(ch)[i]);
        }
        AudioBufferRef::S16(buf) => {
            const I16_NORM: f32 = 32768.0;
            mix_channels(output, channels, buf.frames(), |ch, i| {
                f32::from(buf.chan(ch)[i]) / I16_NORM
            });
        }
        AudioBufferRef::S32(buf) => {
            const I32_NORM: f32 = 2_147_483_648.0;
            #[allow(clippy::cast_precision_loss)]
            mix_channels(output, channels, buf.frames(), |ch, i| {
                buf.chan(ch)[i] as f32 / I32_NORM
            });
        }
        _ => {
            // Unsupported sample format, skip
        }
    }
}

/// Average `channels` interleaved planes into mono samples.
fn mix_channels(
    output: &mut Vec<f32>,
    channels: usize,
    frames: usize,
    sample_at: impl Fn(usize, usize) -> f32,
) {
    if channels == 1 {
        output.extend((0..frames).map(|i| sample_at(0, i)));
        return;
    }

    #[allow(clippy::cast_precision_loss)]
    let scale = 1.0 / channels as f32;
    for i in 0..frames {
        let sum: f32 = (0..channels).map(|ch| sample_at(ch, i)).sum();
        output.push(sum * scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_missing_file_is_open_error() {
        let result = decode_audio_file(Path::new("/nonexistent/recording.wav"));
        assert!(matches!(result, Err(Error::AudioOpen { .. })));
    }

    #[test]
    fn test_mix_channels_stereo_average() {
        let left = [1.0f32, 0.0, 0.5];
        let right = [0.0f32, 1.0, 0.5];
        let mut output = Vec::new();
        mix_channels(&mut output, 2, 3, |ch, i| if ch == 0 { left[i] } else { right[i] });
        assert_eq!(output, vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_mix_channels_mono_passthrough() {
        let mono = [0.1f32, 0.2, 0.3];
        let mut output = Vec::new();
        mix_channels(&mut output, 1, 3, |_, i| mono[i]);
        assert_eq!(output, vec![0.1, 0.2, 0.3]);
    }
}
