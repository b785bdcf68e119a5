//! Detection result writers.

mod csv;
mod json;
mod writer;

pub use csv::CsvWriter;
pub use json::{JsonDetection, JsonResultFile, JsonSettings, JsonSummary, JsonResultWriter};
pub use writer::OutputWriter;

use crate::config::OutputFormat;
use crate::constants::output_extensions;
use std::path::{Path, PathBuf};

/// Determine the output directory for an input file.
pub fn output_dir_for(input: &Path, explicit_output_dir: Option<&Path>) -> PathBuf {
    explicit_output_dir.map_or_else(
        || {
            input
                .parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        },
        Path::to_path_buf,
    )
}

/// Output file path for a given format.
pub fn output_path_for(input: &Path, output_dir: &Path, format: OutputFormat) -> PathBuf {
    // to_string_lossy() keeps non-UTF-8 filenames workable
    let stem = input.file_stem().map_or_else(
        || std::borrow::Cow::Borrowed("output"),
        |s| s.to_string_lossy(),
    );

    let extension = match format {
        OutputFormat::Csv => output_extensions::CSV,
        OutputFormat::Json => output_extensions::JSON,
    };

    output_dir.join(format!("{stem}{extension}"))
}
