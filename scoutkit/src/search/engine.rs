use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::matcher::PatternMatcher;
use super::processor::FileProcessor;
use crate::config::{default_thread_count, DEFAULT_EXCLUDE_DIRS};
use crate::errors::ScoutResult;
use crate::filters::{is_likely_binary, FileNameGlob};
use crate::metrics::ScanMetrics;
use crate::pool::WorkerPool;
use crate::results::SearchOutput;
use crate::walker::PathWalker;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub pattern: String,
    pub root: PathBuf,
    pub is_regex: bool,
    pub ignore_case: bool,
    /// Glob matched against file names; empty accepts every file
    pub file_glob: String,
    pub max_results: usize,
    pub exclude_dirs: Vec<String>,
    pub thread_count: NonZeroUsize,
}

impl SearchOptions {
    pub fn new(pattern: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            pattern: pattern.into(),
            root: root.into(),
            is_regex: false,
            ignore_case: false,
            file_glob: String::new(),
            max_results: 100,
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            thread_count: default_thread_count(),
        }
    }
}

/// Performs a concurrent search across files in a directory.
///
/// Files are searched in ordered parallel batches and the run stops once
/// `max_results` matches have been gathered, so a capped result is always a
/// prefix of the uncapped one. Configuration failures (bad regex, bad glob,
/// unreadable root) are reported in `error`; unreadable files are skipped.
pub fn search(options: &SearchOptions) -> SearchOutput {
    info!("Starting search for {:?} in {}", options.pattern, options.root.display());

    match run_search(options) {
        Ok(output) => {
            info!("Search complete. Found {} matches", output.count);
            output
        }
        Err(e) => {
            debug!("Search failed: {}", e);
            SearchOutput::failed(e.to_string())
        }
    }
}

fn run_search(options: &SearchOptions) -> ScoutResult<SearchOutput> {
    let matcher = PatternMatcher::new(&options.pattern, options.is_regex, options.ignore_case)?;
    let glob = FileNameGlob::new(&options.file_glob)?;
    let files = candidate_files(&options.root, &options.exclude_dirs, &glob)?;
    debug!("Found {} files to process", files.len());

    let pool = WorkerPool::new(options.thread_count)?;
    let metrics = ScanMetrics::new();
    let processor = FileProcessor::new(&matcher, &metrics);
    let mut output = SearchOutput::new();

    if options.max_results > 0 {
        pool.map_batches(
            &files,
            |path| match processor.process_file(path) {
                Ok(matches) => matches,
                Err(e) => {
                    metrics.record_skip(&e.to_string());
                    Vec::new()
                }
            },
            |batch| {
                let mut keep_going = true;
                for matches in batch {
                    if !output.extend_capped(matches, options.max_results) {
                        keep_going = false;
                        break;
                    }
                }
                keep_going
            },
        );
    }

    metrics.log_stats("search");
    Ok(output)
}

fn candidate_files(
    root: &Path,
    exclude_dirs: &[String],
    glob: &FileNameGlob,
) -> ScoutResult<Vec<PathBuf>> {
    let files = PathWalker::new(root)
        .exclude(exclude_dirs.iter().cloned())
        .collect()?;
    Ok(files
        .into_iter()
        .filter(|path| glob.matches(path) && !is_likely_binary(path))
        .collect())
}
