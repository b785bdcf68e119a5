//! Directory watcher end-to-end tests.
//!
//! The analyze function is stubbed out so the tests exercise scanning,
//! debouncing, queueing and draining without real audio or models.

use avescan::detect::Detection;
use avescan::watch::{DirectoryWatcher, WatchOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn fast_options() -> WatchOptions {
    WatchOptions {
        poll_interval: Duration::from_millis(50),
        debounce: Duration::from_millis(100),
        workers: 2,
    }
}

fn write_wav(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write test file");
    path
}

/// Poll until `done` returns true or the timeout elapses.
fn wait_for(timeout: Duration, done: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    done()
}

#[test]
fn test_watcher_processes_settled_files() {
    let dir = tempfile::tempdir().expect("create temp dir");
    write_wav(dir.path(), "one.wav", b"aaaa");
    write_wav(dir.path(), "two.wav", b"bbbb");
    write_wav(dir.path(), "notes.txt", b"ignored");

    let seen = Arc::new(Mutex::new(Vec::<PathBuf>::new()));
    let seen_cb = Arc::clone(&seen);

    let watcher = DirectoryWatcher::start(
        dir.path().to_path_buf(),
        Arc::new(|_| Ok(Vec::<Detection>::new())),
        Arc::new(move |path, _| {
            seen_cb.lock().expect("lock").push(path.to_path_buf());
        }),
        fast_options(),
    )
    .expect("start watcher");

    assert!(wait_for(Duration::from_secs(5), || {
        seen.lock().expect("lock").len() == 2
    }));
    watcher.stop().expect("stop watcher");

    let mut names: Vec<String> = seen
        .lock()
        .expect("lock")
        .iter()
        .map(|p| p.file_name().expect("name").to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["one.wav".to_string(), "two.wav".to_string()]);
}

#[test]
fn test_watcher_does_not_reprocess_unchanged_files() {
    let dir = tempfile::tempdir().expect("create temp dir");
    write_wav(dir.path(), "stable.wav", b"aaaa");

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_cb = Arc::clone(&calls);

    let watcher = DirectoryWatcher::start(
        dir.path().to_path_buf(),
        Arc::new(|_| Ok(Vec::new())),
        Arc::new(move |_, _| {
            calls_cb.fetch_add(1, Ordering::SeqCst);
        }),
        fast_options(),
    )
    .expect("start watcher");

    assert!(wait_for(Duration::from_secs(5), || {
        calls.load(Ordering::SeqCst) == 1
    }));

    // Several more scan cycles pass; the unchanged file stays processed
    std::thread::sleep(Duration::from_millis(500));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    watcher.stop().expect("stop watcher");
}

#[test]
fn test_watcher_requeues_modified_file() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = write_wav(dir.path(), "growing.wav", b"aaaa");

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_cb = Arc::clone(&calls);

    let watcher = DirectoryWatcher::start(
        dir.path().to_path_buf(),
        Arc::new(|_| Ok(Vec::new())),
        Arc::new(move |_, _| {
            calls_cb.fetch_add(1, Ordering::SeqCst);
        }),
        fast_options(),
    )
    .expect("start watcher");

    assert!(wait_for(Duration::from_secs(5), || {
        calls.load(Ordering::SeqCst) == 1
    }));

    // Rewrite with different content; the new signature settles and the
    // file is analyzed again
    std::fs::write(&path, b"aaaabbbb").expect("rewrite");
    assert!(wait_for(Duration::from_secs(5), || {
        calls.load(Ordering::SeqCst) == 2
    }));

    watcher.stop().expect("stop watcher");
}

#[test]
fn test_watcher_reports_failures_without_retry() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = write_wav(dir.path(), "broken.wav", b"aaaa");

    let failures = Arc::new(AtomicUsize::new(0));
    let failures_cb = Arc::clone(&failures);

    let watcher = DirectoryWatcher::start(
        dir.path().to_path_buf(),
        Arc::new(|_| {
            Err(avescan::Error::Internal {
                message: "decode failed".to_string(),
            })
        }),
        Arc::new(move |_, result| {
            if result.is_err() {
                failures_cb.fetch_add(1, Ordering::SeqCst);
            }
        }),
        fast_options(),
    )
    .expect("start watcher");

    assert!(wait_for(Duration::from_secs(5), || {
        failures.load(Ordering::SeqCst) == 1
    }));
    // Failed entries leave the tracking map; the callback is the record
    assert!(wait_for(Duration::from_secs(2), || {
        !watcher.status().contains_key(&path)
    }));

    // No automatic retry for the unchanged failed file
    std::thread::sleep(Duration::from_millis(500));
    assert_eq!(failures.load(Ordering::SeqCst), 1);

    watcher.stop().expect("stop watcher");
}

#[test]
fn test_status_map_does_not_accumulate_completed_entries() {
    let dir = tempfile::tempdir().expect("create temp dir");
    for i in 0..3 {
        write_wav(dir.path(), &format!("done{i}.wav"), b"aaaa");
    }

    let processed = Arc::new(AtomicUsize::new(0));
    let processed_cb = Arc::clone(&processed);

    let watcher = DirectoryWatcher::start(
        dir.path().to_path_buf(),
        Arc::new(|_| Ok(Vec::new())),
        Arc::new(move |_, _| {
            processed_cb.fetch_add(1, Ordering::SeqCst);
        }),
        fast_options(),
    )
    .expect("start watcher");

    assert!(wait_for(Duration::from_secs(5), || {
        processed.load(Ordering::SeqCst) == 3
    }));
    assert!(wait_for(Duration::from_secs(2), || {
        watcher.status().is_empty()
    }));

    watcher.stop().expect("stop watcher");
}

#[test]
fn test_stop_drains_queued_files() {
    let dir = tempfile::tempdir().expect("create temp dir");
    for i in 0..6 {
        write_wav(dir.path(), &format!("clip{i}.wav"), b"aaaa");
    }

    let processed = Arc::new(AtomicUsize::new(0));
    let processed_cb = Arc::clone(&processed);

    let watcher = DirectoryWatcher::start(
        dir.path().to_path_buf(),
        Arc::new(|_| {
            // Slow analysis so entries are still queued when stop() runs
            std::thread::sleep(Duration::from_millis(100));
            Ok(Vec::new())
        }),
        Arc::new(move |_, _| {
            processed_cb.fetch_add(1, Ordering::SeqCst);
        }),
        WatchOptions {
            workers: 1,
            ..fast_options()
        },
    )
    .expect("start watcher");

    // Wait until the scanner has had time to enqueue everything
    assert!(wait_for(Duration::from_secs(5), || {
        processed.load(Ordering::SeqCst) >= 1
    }));

    watcher.stop().expect("stop watcher");
    assert_eq!(processed.load(Ordering::SeqCst), 6);
}
