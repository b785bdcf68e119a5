//! Polling directory scanner feeding a bounded worker pool.

use crate::constants::watch::QUEUE_CAPACITY;
use crate::detect::Detection;
use crate::error::{Error, Result};
use crate::pipeline::is_audio_file;
use crate::watch::{DebounceTracker, FileSignature, WatchEntry, WatchState};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify, mpsc};
use tracing::{debug, info, warn};

/// Analyzes one audio file, returning its detections.
pub type AnalyzeFn = Arc<dyn Fn(&Path) -> Result<Vec<Detection>> + Send + Sync>;

/// Invoked once per processed file with the analysis outcome.
pub type DetectionCallback = Arc<dyn Fn(&Path, Result<Vec<Detection>>) + Send + Sync>;

/// Tuning for the directory watcher.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// How often the directory is rescanned.
    pub poll_interval: Duration,
    /// How long a file's size and mtime must hold still before queueing.
    pub debounce: Duration,
    /// Number of concurrent analysis workers.
    pub workers: usize,
}

impl Default for WatchOptions {
    fn default() -> Self {
        use crate::constants::watch;
        Self {
            poll_interval: watch::DEFAULT_POLL_INTERVAL,
            debounce: watch::DEFAULT_DEBOUNCE,
            workers: watch::DEFAULT_WORKERS,
        }
    }
}

type StatusMap = Arc<StdMutex<HashMap<PathBuf, WatchState>>>;

/// Watches a directory and analyzes audio files as they settle.
///
/// One scanner task polls the directory tree; settled files go onto a
/// bounded queue consumed by a fixed pool of workers. The watcher owns its
/// own runtime, so callers need no async context. [`Self::stop`] shuts the
/// scanner down and drains everything already queued before returning.
pub struct DirectoryWatcher {
    runtime: tokio::runtime::Runtime,
    shutdown: Arc<AtomicBool>,
    stop_signal: Arc<Notify>,
    scanner: tokio::task::JoinHandle<()>,
    workers: Vec<tokio::task::JoinHandle<()>>,
    status: StatusMap,
}

impl DirectoryWatcher {
    /// Start watching a directory.
    ///
    /// `analyze` runs on a blocking thread per file; `callback` receives the
    /// outcome on a worker task. Failed files are reported and not retried.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the path is not a directory or
    /// `workers` is zero, and an internal error when the runtime cannot be
    /// created.
    pub fn start(
        dir: PathBuf,
        analyze: AnalyzeFn,
        callback: DetectionCallback,
        options: WatchOptions,
    ) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::Configuration {
                message: format!("watch path is not a directory: {}", dir.display()),
            });
        }
        if options.workers == 0 {
            return Err(Error::Configuration {
                message: "watch worker count must be at least 1".to_string(),
            });
        }

        let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal {
            message: format!("Failed to create async runtime: {e}"),
        })?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let stop_signal = Arc::new(Notify::new());
        let status: StatusMap = Arc::new(StdMutex::new(HashMap::new()));
        let (tx, rx) = mpsc::channel::<WatchEntry>(QUEUE_CAPACITY);
        let rx = Arc::new(Mutex::new(rx));

        info!(
            "Watching {} ({} workers, {:.0}s poll, {:.0}s debounce)",
            dir.display(),
            options.workers,
            options.poll_interval.as_secs_f64(),
            options.debounce.as_secs_f64()
        );

        let scanner = runtime.spawn(scan_loop(
            dir,
            tx,
            Arc::clone(&shutdown),
            Arc::clone(&stop_signal),
            Arc::clone(&status),
            options.clone(),
        ));

        let workers = (0..options.workers)
            .map(|_| {
                runtime.spawn(worker_loop(
                    Arc::clone(&rx),
                    Arc::clone(&analyze),
                    Arc::clone(&callback),
                    Arc::clone(&status),
                ))
            })
            .collect();

        Ok(Self {
            runtime,
            shutdown,
            stop_signal,
            scanner,
            workers,
            status,
        })
    }

    /// Snapshot of in-flight per-file states.
    ///
    /// Entries are dropped from the map once their completion or failure
    /// callback has run, so a long-running watch does not accumulate them.
    pub fn status(&self) -> HashMap<PathBuf, WatchState> {
        self.status
            .lock()
            .map(|map| map.clone())
            .unwrap_or_default()
    }

    /// Stop scanning, drain the queue and wait for workers to finish.
    ///
    /// Files already queued are still analyzed; nothing new is picked up.
    pub fn stop(self) -> Result<()> {
        info!("Stopping watcher, draining queued files");
        self.shutdown.store(true, Ordering::SeqCst);
        self.stop_signal.notify_one();

        self.runtime.block_on(async {
            if let Err(e) = self.scanner.await {
                warn!("Scanner task panicked: {e}");
            }
            for worker in self.workers {
                if let Err(e) = worker.await {
                    warn!("Worker task panicked: {e}");
                }
            }
        });

        Ok(())
    }
}

/// Scan the directory tree until shutdown, queueing settled audio files.
///
/// Dropping `tx` on exit closes the queue; workers drain what remains.
async fn scan_loop(
    dir: PathBuf,
    tx: mpsc::Sender<WatchEntry>,
    shutdown: Arc<AtomicBool>,
    stop_signal: Arc<Notify>,
    status: StatusMap,
    options: WatchOptions,
) {
    let mut tracker = DebounceTracker::new(options.debounce);

    while !shutdown.load(Ordering::SeqCst) {
        let now = Instant::now();
        let mut found = Vec::new();
        if let Err(e) = scan_dir(&dir, &mut found) {
            warn!("Scan of {} failed: {e}", dir.display());
        }

        for path in &found {
            match FileSignature::read(path) {
                Ok(signature) => tracker.observe(path, signature, now),
                // Deleted between listing and stat
                Err(e) => debug!("Skipping {}: {e}", path.display()),
            }
        }
        tracker.prune(|path| path.exists());

        for entry in tracker.take_ready(now) {
            debug!("Queueing {}", entry.path.display());
            let path = entry.path.clone();
            if let Ok(mut map) = status.lock() {
                map.insert(path.clone(), WatchState::Pending);
            }
            tokio::select! {
                result = tx.send(entry) => {
                    if result.is_err() {
                        // Queue closed; the entry never reached a worker
                        remove_status(&status, &path);
                        return;
                    }
                }
                () = stop_signal.notified() => {
                    remove_status(&status, &path);
                    return;
                }
            }
        }

        tokio::select! {
            () = tokio::time::sleep(options.poll_interval) => {}
            () = stop_signal.notified() => break,
        }
    }
}

fn scan_dir(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            scan_dir(&path, files)?;
        } else if is_audio_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Pull entries off the shared queue until it closes.
async fn worker_loop(
    rx: Arc<Mutex<mpsc::Receiver<WatchEntry>>>,
    analyze: AnalyzeFn,
    callback: DetectionCallback,
    status: StatusMap,
) {
    loop {
        // Lock held only while waiting for one entry
        let entry = { rx.lock().await.recv().await };
        let Some(entry) = entry else { break };

        if let Ok(mut map) = status.lock() {
            map.insert(entry.path.clone(), WatchState::InProgress);
        }

        let analyze = Arc::clone(&analyze);
        let path = entry.path.clone();
        let result = tokio::task::spawn_blocking(move || analyze(&path))
            .await
            .unwrap_or_else(|e| {
                Err(Error::Internal {
                    message: format!("analysis task panicked: {e}"),
                })
            });

        let state = if result.is_ok() {
            WatchState::Done
        } else {
            WatchState::Failed
        };
        if let Ok(mut map) = status.lock() {
            map.insert(entry.path.clone(), state);
        }
        if let Err(e) = &result {
            warn!("Analysis of {} failed: {e}", entry.path.display());
        }

        callback(&entry.path, result);

        // Completed entries leave the tracking map; failures were reported
        // through the callback and are not retried
        remove_status(&status, &entry.path);
    }
}

fn remove_status(status: &StatusMap, path: &Path) {
    if let Ok(mut map) = status.lock() {
        map.remove(path);
    }
}
