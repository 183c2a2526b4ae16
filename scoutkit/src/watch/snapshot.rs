use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, trace};

use crate::errors::ScoutResult;
use crate::filters::ExtensionFilter;
use crate::walker::PathWalker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileState {
    #[serde(with = "crate::timefmt")]
    pub mod_time: SystemTime,
    pub size: u64,
}

/// Path to state, ordered by path
pub type Snapshot = BTreeMap<PathBuf, FileState>;

/// A snapshot as emitted and later read back by `--since`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotResult {
    pub success: bool,
    pub files: Snapshot,
    pub count: usize,
}

impl From<Snapshot> for SnapshotResult {
    fn from(files: Snapshot) -> Self {
        Self {
            success: true,
            count: files.len(),
            files,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub path: PathBuf,
    #[serde(with = "crate::timefmt")]
    pub timestamp: SystemTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Records modification time and size of every file the walker accepts
pub fn capture_snapshot(
    root: &Path,
    extensions: &ExtensionFilter,
    exclude_dirs: &[String],
) -> ScoutResult<Snapshot> {
    let paths = PathWalker::new(root)
        .extensions(extensions.clone())
        .exclude(exclude_dirs.iter().cloned())
        .collect()?;

    let mut snapshot = Snapshot::new();
    for path in paths {
        match std::fs::metadata(&path) {
            Ok(metadata) => {
                let state = FileState {
                    mod_time: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                    size: metadata.len(),
                };
                trace!("Snapshot {} ({} bytes)", path.display(), state.size);
                snapshot.insert(path, state);
            }
            // Removed between the walk and the stat
            Err(e) => debug!("Skipping {}: {}", path.display(), e),
        }
    }
    Ok(snapshot)
}

/// Derives change events from two snapshots, ordered by path.
///
/// Only modification time decides `modified`; a size change with an
/// unchanged time is not reported.
pub fn compare(old: &Snapshot, new: &Snapshot) -> Vec<FileEvent> {
    let now = SystemTime::now();
    let mut events = Vec::new();

    for (path, after) in new {
        match old.get(path) {
            None => events.push(FileEvent {
                kind: EventKind::Created,
                path: path.clone(),
                timestamp: after.mod_time,
                size: Some(after.size),
            }),
            Some(before) if before.mod_time != after.mod_time => events.push(FileEvent {
                kind: EventKind::Modified,
                path: path.clone(),
                timestamp: after.mod_time,
                size: Some(after.size),
            }),
            Some(_) => {}
        }
    }

    for path in old.keys().filter(|p| !new.contains_key(*p)) {
        events.push(FileEvent {
            kind: EventKind::Deleted,
            path: path.clone(),
            timestamp: now,
            size: None,
        });
    }

    events.sort_by(|a, b| a.path.cmp(&b.path));
    events
}
