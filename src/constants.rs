//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "avescan";

/// Default minimum confidence threshold for detections.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.1;

/// Default window overlap in seconds.
pub const DEFAULT_OVERLAP: f32 = 0.0;

/// Confidence value bounds.
pub mod confidence {
    /// Minimum valid confidence value.
    pub const MIN: f32 = 0.0;
    /// Maximum valid confidence value.
    pub const MAX: f32 = 1.0;
    /// Decimal places for confidence formatting.
    pub const DECIMAL_PLACES: usize = 4;
}

/// Occurrence filter constants.
pub mod occurrence {
    /// `BirdNET` uses 48 weeks per year.
    pub const WEEKS_PER_YEAR: u32 = 48;

    /// Days per `BirdNET` week (365.25 / 48).
    pub const DAYS_PER_WEEK: f32 = 7.6;

    /// First day of the year (January 1st) for week-to-day offset calculation.
    pub const YEAR_START_DAY: f32 = 1.0;

    /// Default occurrence score threshold.
    pub const DEFAULT_THRESHOLD: f32 = 0.03;

    /// Decimal places a location is rounded to for cache keys.
    ///
    /// Two decimals is roughly a 1 km grid, well below the resolution of the
    /// occurrence model.
    pub const LOCATION_KEY_DECIMALS: i32 = 2;

    /// Season midpoint weeks queried when a recording has a location but no
    /// date. The union of the four predictions approximates a year-round
    /// species set.
    pub const SEASON_MIDPOINT_WEEKS: [u32; 4] = [6, 18, 30, 42];
}

/// Calendar constants.
pub mod calendar {
    /// Days in each month (non-leap year).
    pub const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
}

/// Directory watch queue constants.
pub mod watch {
    use std::time::Duration;

    /// Default interval between directory scans.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

    /// Default time a file's (size, mtime) signature must remain stable
    /// before the file is enqueued.
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(5);

    /// Default number of analysis workers.
    pub const DEFAULT_WORKERS: usize = 2;

    /// Capacity of the entry channel between the scanner and the workers.
    pub const QUEUE_CAPACITY: usize = 256;
}

/// Output file extensions by format.
pub mod output_extensions {
    /// CSV output extension.
    pub const CSV: &str = ".avescan.results.csv";
    /// JSON output extension.
    pub const JSON: &str = ".avescan.json";
}
