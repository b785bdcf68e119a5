//! Watched-file bookkeeping and write-settle debouncing.
//!
//! Recorders write audio files incrementally, so a file is only queued once
//! its size and modification time have held still for the debounce period.
//! Processed files are remembered by signature; a later change to the same
//! path queues it again.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Size and mtime of a file at one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSignature {
    /// File size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
}

impl FileSignature {
    /// Read the current signature of a file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file's metadata cannot be read.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            size: meta.len(),
            modified: meta.modified()?,
        })
    }
}

/// Processing state of a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Queued, waiting for a worker.
    Pending,
    /// A worker is analyzing it.
    InProgress,
    /// Analysis finished and the callback ran.
    Done,
    /// Analysis failed; the file is not retried automatically.
    Failed,
}

/// A file handed from the scanner to the worker queue.
#[derive(Debug, Clone)]
pub struct WatchEntry {
    /// Absolute or watch-relative path of the audio file.
    pub path: PathBuf,
    /// Signature at enqueue time.
    pub signature: FileSignature,
    /// When the file was first observed; entries are queued in this order.
    pub first_seen: Instant,
}

#[derive(Debug)]
struct Candidate {
    signature: FileSignature,
    first_seen: Instant,
    stable_since: Instant,
}

/// Decides when an observed file is ready to enqueue.
///
/// Time is passed in explicitly so scanning stays testable without sleeping.
#[derive(Debug)]
pub struct DebounceTracker {
    debounce: Duration,
    candidates: HashMap<PathBuf, Candidate>,
    processed: HashMap<PathBuf, FileSignature>,
}

impl DebounceTracker {
    /// Create a tracker with the given settle period.
    #[must_use]
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            candidates: HashMap::new(),
            processed: HashMap::new(),
        }
    }

    /// Record one observation of a file.
    ///
    /// A changed signature restarts the settle timer; a file already
    /// processed at this signature is ignored.
    pub fn observe(&mut self, path: &Path, signature: FileSignature, now: Instant) {
        if self.processed.get(path) == Some(&signature) {
            self.candidates.remove(path);
            return;
        }

        match self.candidates.entry(path.to_path_buf()) {
            Entry::Occupied(mut entry) => {
                let candidate = entry.get_mut();
                // A changed signature restarts the settle timer but keeps
                // the original first-seen time
                if candidate.signature != signature {
                    candidate.signature = signature;
                    candidate.stable_since = now;
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Candidate {
                    signature,
                    first_seen: now,
                    stable_since: now,
                });
            }
        }
    }

    /// Take every candidate whose signature has held still for the full
    /// debounce period, in first-seen order, marking each as processed at
    /// that signature.
    pub fn take_ready(&mut self, now: Instant) -> Vec<WatchEntry> {
        let ready: Vec<PathBuf> = self
            .candidates
            .iter()
            .filter(|(_, c)| now.duration_since(c.stable_since) >= self.debounce)
            .map(|(path, _)| path.clone())
            .collect();

        let mut entries: Vec<WatchEntry> = ready
            .into_iter()
            .filter_map(|path| {
                let candidate = self.candidates.remove(&path)?;
                self.processed.insert(path.clone(), candidate.signature);
                Some(WatchEntry {
                    path,
                    signature: candidate.signature,
                    first_seen: candidate.first_seen,
                })
            })
            .collect();
        entries.sort_by_key(|entry| entry.first_seen);
        entries
    }

    /// Drop candidates for files that no longer exist on disk.
    pub fn prune(&mut self, exists: impl Fn(&Path) -> bool) {
        self.candidates.retain(|path, _| exists(path));
        self.processed.retain(|path, _| exists(path));
    }
}
