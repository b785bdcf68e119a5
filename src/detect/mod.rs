//! Detection scoring, occurrence filtering and aggregation.

mod aggregator;
mod occurrence;
mod scorer;
mod types;

pub use aggregator::aggregate;
pub use occurrence::{OccurrenceFilter, OccurrenceSet};
pub use scorer::DetectionScorer;
pub use types::{Detection, SpeciesScore, WindowScores};
