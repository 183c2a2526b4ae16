use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Counters shared by the workers of one scan
#[derive(Debug, Default)]
pub struct ScanMetrics {
    files_scanned: AtomicU64,
    bytes_read: AtomicU64,
    files_skipped: AtomicU64,
    mmap_files: AtomicU64,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a file that was read to completion
    pub fn record_file(&self, bytes: u64) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Records a file that was memory mapped rather than streamed
    pub fn record_mmap(&self) {
        self.mmap_files.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a file dropped because it could not be read
    pub fn record_skip(&self, reason: &str) {
        let total = self.files_skipped.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Skipped file ({}), {} skipped so far", reason, total);
    }

    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            mmap_files: self.mmap_files.load(Ordering::Relaxed),
        }
    }

    /// Logs the counters under the given engine name
    pub fn log_stats(&self, engine: &str) {
        let stats = self.get_stats();
        info!(
            "{} scan stats: {} files ({} mapped), {} bytes read, {} skipped",
            engine, stats.files_scanned, stats.mmap_files, stats.bytes_read, stats.files_skipped
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub files_scanned: u64,
    pub bytes_read: u64,
    pub files_skipped: u64,
    pub mmap_files: u64,
}
