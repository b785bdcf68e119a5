//! Directory watching for continuous analysis.

mod entry;
mod queue;

pub use entry::{DebounceTracker, FileSignature, WatchEntry, WatchState};
pub use queue::{AnalyzeFn, DetectionCallback, DirectoryWatcher, WatchOptions};
