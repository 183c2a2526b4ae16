use memmap2::Mmap;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::trace;

use super::matcher::PatternMatcher;
use crate::errors::{ScoutError, ScoutResult};
use crate::metrics::ScanMetrics;
use crate::results::SearchMatch;

const BUFFER_CAPACITY: usize = 65536;
pub(crate) const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

/// Strips the line terminator (`\n` or `\r\n`) and decodes lossily
fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw)
}

/// Scans one file line by line against a pattern
#[derive(Debug)]
pub struct FileProcessor<'a> {
    matcher: &'a PatternMatcher,
    metrics: &'a ScanMetrics,
}

impl<'a> FileProcessor<'a> {
    pub fn new(matcher: &'a PatternMatcher, metrics: &'a ScanMetrics) -> Self {
        Self { matcher, metrics }
    }

    /// Returns every matching line of `path`, in line order
    pub fn process_file(&self, path: &Path) -> ScoutResult<Vec<SearchMatch>> {
        let file = File::open(path).map_err(|e| ScoutError::from_io(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| ScoutError::from_io(path, e))?
            .len();

        let matches = if size >= LARGE_FILE_THRESHOLD {
            self.process_mmap_file(path, &file)?
        } else {
            self.process_file_buffered(path, file)?
        };
        self.metrics.record_file(size);
        Ok(matches)
    }

    /// Process a file using buffered reading
    fn process_file_buffered(&self, path: &Path, file: File) -> ScoutResult<Vec<SearchMatch>> {
        trace!("Buffered scan of {}", path.display());
        let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
        let mut buf = Vec::with_capacity(256);
        let mut matches = Vec::new();
        let mut line_number = 0;

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| ScoutError::from_io(path, e))?;
            if read == 0 {
                break;
            }
            line_number += 1;
            let line = decode_line(&buf);
            if self.matcher.is_match(&line) {
                matches.push(SearchMatch {
                    file: path.to_path_buf(),
                    line: line_number,
                    content: line.into_owned(),
                });
            }
        }

        Ok(matches)
    }

    /// Process a file using memory mapping
    fn process_mmap_file(&self, path: &Path, file: &File) -> ScoutResult<Vec<SearchMatch>> {
        trace!("Memory-mapped scan of {}", path.display());
        // SAFETY: the map is read-only and dropped before this function returns
        let mmap = unsafe { Mmap::map(file) }.map_err(|e| ScoutError::from_io(path, e))?;
        self.metrics.record_mmap();

        let mut matches = Vec::new();
        let mut content: &[u8] = &mmap;
        if let Some(stripped) = content.strip_suffix(b"\n") {
            content = stripped;
        }

        for (index, raw) in content.split(|&b| b == b'\n').enumerate() {
            let line = decode_line(raw);
            if self.matcher.is_match(&line) {
                matches.push(SearchMatch {
                    file: path.to_path_buf(),
                    line: index + 1,
                    content: line.into_owned(),
                });
            }
        }

        Ok(matches)
    }
}
