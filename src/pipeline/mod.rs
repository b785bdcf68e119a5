//! Recording analysis pipeline.

mod analyzer;
mod recording;

pub use analyzer::{AnalyzeOptions, RecordingPipeline, collect_input_files, is_audio_file};
pub use recording::{AnalysisState, Recording, RecordingSource};
