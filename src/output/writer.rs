//! Common interface over the result file formats.

use crate::detect::Detection;
use crate::error::Result;

/// Sink for the detections of one analyzed recording.
///
/// Format-specific setup (CSV header rows and the like) happens when the
/// concrete writer is constructed; `finalize` must be called once after the
/// last detection to flush buffered output to disk.
pub trait OutputWriter {
    /// Append a single detection.
    fn write_detection(&mut self, detection: &Detection) -> Result<()>;

    /// Append every detection in order.
    fn write_detections(&mut self, detections: &[Detection]) -> Result<()> {
        for detection in detections {
            self.write_detection(detection)?;
        }
        Ok(())
    }

    /// Complete the result file.
    fn finalize(&mut self) -> Result<()>;
}
