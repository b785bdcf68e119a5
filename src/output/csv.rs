//! CSV output format writer.

use crate::constants::confidence::DECIMAL_PLACES;
use crate::detect::Detection;
use crate::error::Result;
use crate::output::OutputWriter;
use std::fs::File;
use std::path::{Path, PathBuf};

/// CSV format output writer.
///
/// One row per detection; the source file column is the same for every row
/// of one result file and is fixed at construction.
pub struct CsvWriter {
    writer: csv::Writer<File>,
    source_file: PathBuf,
}

impl CsvWriter {
    /// Create a CSV writer for the detections of `source_file` and write the
    /// header row.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the output file cannot be created.
    pub fn new(path: &Path, source_file: &Path) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record([
            "Start (s)",
            "End (s)",
            "Scientific name",
            "Common name",
            "Confidence",
            "File",
        ])?;
        Ok(Self {
            writer,
            source_file: source_file.to_path_buf(),
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_detection(&mut self, detection: &Detection) -> Result<()> {
        self.writer.write_record([
            format!("{:.1}", detection.start_time),
            format!("{:.1}", detection.end_time),
            detection.scientific_name.clone(),
            detection.common_name.clone(),
            format!("{:.decimal$}", detection.confidence, decimal = DECIMAL_PLACES),
            self.source_file.display().to_string(),
        ])?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_csv_writer_basic() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = CsvWriter::new(file.path(), Path::new("/path/to/audio.wav")).unwrap();

        let detection =
            Detection::from_label("Passer domesticus_House Sparrow", 0.8542, 0.0, 3.0);
        writer.write_detection(&detection).unwrap();
        writer.finalize().unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.starts_with("Start (s),End (s)"));
        assert!(contents.contains("House Sparrow"));
        assert!(contents.contains("0.8542"));
        assert!(contents.contains("/path/to/audio.wav"));
    }

    #[test]
    fn test_csv_writer_quotes_special_characters() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = CsvWriter::new(file.path(), Path::new("a.wav")).unwrap();

        let detection = Detection::from_label("Genus species_Name, with comma", 0.5, 0.0, 3.0);
        writer.write_detection(&detection).unwrap();
        writer.finalize().unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.contains("\"Name, with comma\""));
    }
}
