//! Audio decoding, resampling and windowing.

mod decode;
mod resample;
mod segmenter;

pub use decode::{DecodedAudio, decode_audio_file};
pub use resample::resample;
pub use segmenter::{Window, segment};
