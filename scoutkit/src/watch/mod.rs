//! Polling change detection over a directory tree.
//!
//! A [`Snapshot`] records modification time and size per file; comparing two
//! snapshots yields created, modified and deleted [`FileEvent`]s. The modes
//! built on top are a one-off snapshot, a comparison against a snapshot
//! file written earlier, a bounded live watch and an unbounded event stream.

mod cancellation;
mod snapshot;

pub use cancellation::WatchCancellation;
pub use snapshot::{
    capture_snapshot, compare, EventKind, FileEvent, FileState, Snapshot, SnapshotResult,
};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::DEFAULT_EXCLUDE_DIRS;
use crate::errors::{ScoutError, ScoutResult};
use crate::filters::ExtensionFilter;

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub root: PathBuf,
    pub extensions: ExtensionFilter,
    pub exclude_dirs: Vec<String>,
    pub poll_interval: Duration,
}

impl WatchOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: ExtensionFilter::any(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            poll_interval: Duration::from_millis(1000),
        }
    }

    fn capture(&self) -> ScoutResult<Snapshot> {
        capture_snapshot(&self.root, &self.extensions, &self.exclude_dirs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchResult {
    pub success: bool,
    pub events: Vec<FileEvent>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WatchResult {
    fn from_events(events: Vec<FileEvent>) -> Self {
        Self {
            success: true,
            count: events.len(),
            events,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Events gathered before a poll failed
    fn interrupted(events: Vec<FileEvent>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            count: events.len(),
            events,
            error: Some(error.into()),
        }
    }
}

/// Captures the current state of the tree
pub fn take_snapshot(options: &WatchOptions) -> ScoutResult<SnapshotResult> {
    let snapshot = options.capture()?;
    info!("Snapshot of {}: {} files", options.root.display(), snapshot.len());
    Ok(SnapshotResult::from(snapshot))
}

/// Compares the current tree against a snapshot file written by a previous run
pub fn compare_since(options: &WatchOptions, snapshot_file: &Path) -> WatchResult {
    match load_snapshot(snapshot_file).and_then(|old| Ok((old, options.capture()?))) {
        Ok((old, current)) => {
            let events = compare(&old.files, &current);
            info!(
                "{} changes since {}",
                events.len(),
                snapshot_file.display()
            );
            WatchResult::from_events(events)
        }
        Err(e) => WatchResult::failed(e.to_string()),
    }
}

fn load_snapshot(path: &Path) -> ScoutResult<SnapshotResult> {
    let data = std::fs::read_to_string(path).map_err(|e| ScoutError::from_io(path, e))?;
    Ok(serde_json::from_str(&data)?)
}

/// Watches for `duration`, accumulating events from every poll.
///
/// Returns early with what was gathered so far when `cancel` fires or a
/// poll fails; in the latter case `error` is set as well.
pub fn watch_for(
    options: &WatchOptions,
    duration: Duration,
    cancel: &WatchCancellation,
) -> WatchResult {
    let mut state = match options.capture() {
        Ok(state) => state,
        Err(e) => return WatchResult::failed(e.to_string()),
    };

    let deadline = Instant::now() + duration;
    let mut events = Vec::new();
    while Instant::now() < deadline {
        if cancel.wait(options.poll_interval) {
            debug!("Bounded watch cancelled");
            break;
        }
        match options.capture() {
            Ok(next) => {
                events.extend(compare(&state, &next));
                state = next;
            }
            Err(e) => return WatchResult::interrupted(events, e.to_string()),
        }
    }

    WatchResult::from_events(events)
}

/// Polls until cancelled, handing every event to `sink` as it is detected.
///
/// A sink error stops the loop and is returned.
pub fn watch_stream<F>(options: &WatchOptions, cancel: &WatchCancellation, mut sink: F) -> ScoutResult<()>
where
    F: FnMut(&FileEvent) -> ScoutResult<()>,
{
    let mut state = options.capture()?;
    info!("Watching {} ({} files)", options.root.display(), state.len());

    while !cancel.wait(options.poll_interval) {
        let next = options.capture()?;
        for event in compare(&state, &next) {
            sink(&event)?;
        }
        state = next;
    }

    debug!("Watch stream stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;
    use tempfile::tempdir;

    fn fast(root: &Path) -> WatchOptions {
        let mut options = WatchOptions::new(root);
        options.poll_interval = Duration::from_millis(20);
        options
    }

    #[test]
    fn test_compare_since_snapshot_file() {
        let dir = tempdir().unwrap();
        let tree = dir.path().join("tree");
        fs::create_dir(&tree).unwrap();
        fs::write(tree.join("keep.txt"), "keep").unwrap();
        fs::write(tree.join("gone.txt"), "gone").unwrap();

        let options = WatchOptions::new(&tree);
        let snapshot = take_snapshot(&options).unwrap();
        assert_eq!(snapshot.count, 2);
        let snapshot_file = dir.path().join("snap.json");
        fs::write(&snapshot_file, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();

        fs::remove_file(tree.join("gone.txt")).unwrap();
        fs::write(tree.join("new.txt"), "new").unwrap();

        let result = compare_since(&options, &snapshot_file);
        assert!(result.success);
        assert_eq!(result.count, 2);
        assert_eq!(result.events[0].kind, EventKind::Deleted);
        assert!(result.events[0].path.ends_with("gone.txt"));
        assert_eq!(result.events[1].kind, EventKind::Created);
        assert_eq!(result.events[1].size, Some(3));
    }

    #[test]
    fn test_compare_since_missing_file() {
        let dir = tempdir().unwrap();
        let result = compare_since(&WatchOptions::new(dir.path()), &dir.path().join("none.json"));
        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_watch_for_sees_new_file() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let writer = thread::spawn({
            let root = root.clone();
            move || {
                thread::sleep(Duration::from_millis(60));
                fs::write(root.join("late.txt"), "late").unwrap();
            }
        });

        let result = watch_for(&fast(&root), Duration::from_millis(400), &WatchCancellation::new());
        writer.join().unwrap();

        assert!(result.success);
        assert!(result
            .events
            .iter()
            .any(|e| e.kind == EventKind::Created && e.path.ends_with("late.txt")));
    }

    #[test]
    fn test_watch_for_keeps_events_when_poll_fails() {
        let dir = tempdir().unwrap();
        let tree = dir.path().join("tree");
        fs::create_dir(&tree).unwrap();
        let writer = thread::spawn({
            let tree = tree.clone();
            move || {
                thread::sleep(Duration::from_millis(60));
                fs::write(tree.join("late.txt"), "late").unwrap();
                thread::sleep(Duration::from_millis(200));
                fs::remove_dir_all(&tree).unwrap();
            }
        });

        let result = watch_for(&fast(&tree), Duration::from_secs(2), &WatchCancellation::new());
        writer.join().unwrap();

        assert!(!result.success);
        assert!(result.error.is_some());
        assert_eq!(result.count, result.events.len());
        assert!(result
            .events
            .iter()
            .any(|e| e.kind == EventKind::Created && e.path.ends_with("late.txt")));
    }

    #[test]
    fn test_watch_stream_stops_on_cancel() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let token = WatchCancellation::new();

        let remote = token.clone();
        let writer = thread::spawn({
            let root = root.clone();
            move || {
                thread::sleep(Duration::from_millis(60));
                fs::write(root.join("a.txt"), "a").unwrap();
                thread::sleep(Duration::from_millis(200));
                remote.cancel();
            }
        });

        let mut seen = Vec::new();
        watch_stream(&fast(&root), &token, |event| {
            seen.push(event.clone());
            Ok(())
        })
        .unwrap();
        writer.join().unwrap();

        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, EventKind::Created);
    }
}
