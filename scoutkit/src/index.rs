//! File indexing: per-file metadata with an optional MD5 content hash.
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};
use tracing::{info, trace};

use crate::config::{default_thread_count, DEFAULT_EXCLUDE_DIRS};
use crate::errors::ScoutResult;
use crate::filters::{dotted_extension, ExtensionFilter};
use crate::metrics::ScanMetrics;
use crate::pool::WorkerPool;
use crate::walker::PathWalker;

const HASH_BUFFER_CAPACITY: usize = 65536;

/// Metadata recorded for one file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    /// Extension including the leading dot, empty when the file has none
    pub extension: String,
    #[serde(with = "crate::timefmt")]
    pub modified: SystemTime,
    pub is_dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IndexResult {
    pub files: Vec<FileEntry>,
    pub total_files: usize,
    pub total_size: u64,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub root: PathBuf,
    pub with_hash: bool,
    pub extensions: ExtensionFilter,
    pub max_depth: Option<usize>,
    pub exclude_dirs: Vec<String>,
    pub thread_count: NonZeroUsize,
    /// Files of this size or larger are never hashed
    pub hash_size_limit: u64,
}

impl IndexOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            with_hash: false,
            extensions: ExtensionFilter::any(),
            max_depth: None,
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            thread_count: default_thread_count(),
            hash_size_limit: 10 * 1024 * 1024,
        }
    }
}

/// Indexes every file under `options.root` that passes the walk filters
pub fn index_directory(options: &IndexOptions) -> IndexResult {
    let start = Instant::now();
    info!("Indexing {}", options.root.display());

    let mut result = match build_index(options) {
        Ok(result) => result,
        Err(e) => IndexResult {
            error: Some(format!("Walk error: {}", e)),
            ..Default::default()
        },
    };

    result.duration = humantime::format_duration(start.elapsed()).to_string();
    info!(
        "Indexed {} files ({} bytes) in {}",
        result.total_files, result.total_size, result.duration
    );
    result
}

fn build_index(options: &IndexOptions) -> ScoutResult<IndexResult> {
    let paths = PathWalker::new(&options.root)
        .extensions(options.extensions.clone())
        .exclude(options.exclude_dirs.iter().cloned())
        .max_depth(options.max_depth)
        .collect()?;

    let pool = WorkerPool::new(options.thread_count)?;
    let metrics = ScanMetrics::new();

    let entries = pool.map(&paths, |path| {
        index_file(path, options.with_hash, options.hash_size_limit, &metrics)
    });

    let mut result = IndexResult::default();
    for entry in entries.into_iter().flatten() {
        result.total_size += entry.size;
        result.files.push(entry);
    }
    result.total_files = result.files.len();

    metrics.log_stats("index");
    Ok(result)
}

/// Builds the entry for one path; `None` when the path vanished or cannot be stat'ed
fn index_file(
    path: &Path,
    with_hash: bool,
    hash_size_limit: u64,
    metrics: &ScanMetrics,
) -> Option<FileEntry> {
    trace!("Indexing file: {}", path.display());

    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            metrics.record_skip(&e.to_string());
            return None;
        }
    };

    let is_dir = metadata.is_dir();
    let size = metadata.len();
    let hash = if with_hash && metadata.is_file() && size < hash_size_limit {
        hash_file(path).ok()
    } else {
        None
    };
    metrics.record_file(if hash.is_some() { size } else { 0 });

    Some(FileEntry {
        path: path.to_path_buf(),
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        size,
        extension: dotted_extension(path),
        modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        is_dir,
        hash,
    })
}

/// Streams a file through MD5 and returns the lowercase hex digest
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(HASH_BUFFER_CAPACITY, file);
    let mut context = md5::Context::new();
    let mut buffer = vec![0u8; HASH_BUFFER_CAPACITY];

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        context.consume(&buffer[..read]);
    }

    Ok(format!("{:x}", context.compute()))
}
