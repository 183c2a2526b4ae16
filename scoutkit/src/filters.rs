//! Path filters shared by the scanning engines.
//!
//! Filters are free functions over `&Path` rather than a trait: every engine
//! needs the same handful of checks, and the walker composes them directly.
use glob::Pattern;
use std::collections::HashSet;
use std::path::Path;

use crate::errors::{ScoutError, ScoutResult};

/// Normalized, lower-cased extension allow-list (stored without the dot)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionFilter {
    allowed: Option<HashSet<String>>,
}

impl ExtensionFilter {
    /// Accepts every file
    pub fn any() -> Self {
        Self { allowed: None }
    }

    /// Builds a filter from items such as `py`, `.py` or `PY`; an empty list accepts everything
    pub fn from_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed: HashSet<String> = items
            .into_iter()
            .map(|s| s.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        if allowed.is_empty() {
            Self::any()
        } else {
            Self {
                allowed: Some(allowed),
            }
        }
    }

    /// Parses a comma-separated list (`"py,go,.js"`)
    pub fn parse(csv: &str) -> Self {
        Self::from_list(split_list(csv))
    }

    pub fn is_restricted(&self) -> bool {
        self.allowed.is_some()
    }

    /// Checks if a file should be included based on its extension
    pub fn matches(&self, path: &Path) -> bool {
        match &self.allowed {
            None => true,
            Some(exts) => path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| exts.contains(&ext.to_lowercase()))
                .unwrap_or(false),
        }
    }
}

/// Splits a comma-separated flag value, trimming items and dropping empties
pub fn split_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Returns the extension with its leading dot, or an empty string
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

/// Checks whether a directory should be pruned from a walk
pub fn is_pruned_dir(name: &str, exclude: &HashSet<String>) -> bool {
    (name.starts_with('.') && name != "." && name != "..") || exclude.contains(name)
}

/// Checks if a file is likely to be binary, judged by extension only
pub fn is_likely_binary(path: &Path) -> bool {
    const BINARY_EXTENSIONS: &[&str] = &[
        "exe", "dll", "so", "dylib", "bin", "obj", "o", "a", "lib", "pyc", "pyo", "class", "jar",
        "war", "ear", "wasm", "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "pdf", "doc",
        "docx", "xls", "xlsx", "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "mp3", "mp4",
        "mov", "avi", "woff", "woff2", "ttf",
    ];

    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            BINARY_EXTENSIONS
                .iter()
                .any(|&bin_ext| bin_ext.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Glob matched against a file's name (not its full path)
#[derive(Debug, Clone)]
pub struct FileNameGlob {
    pattern: Option<Pattern>,
}

impl FileNameGlob {
    /// An empty pattern matches every file
    pub fn new(pattern: &str) -> ScoutResult<Self> {
        if pattern.trim().is_empty() {
            return Ok(Self { pattern: None });
        }
        let compiled = Pattern::new(pattern)
            .map_err(|e| ScoutError::invalid_pattern(format!("{}: {}", pattern, e)))?;
        Ok(Self {
            pattern: Some(compiled),
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        match &self.pattern {
            None => true,
            Some(p) => path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| p.matches(n))
                .unwrap_or(false),
        }
    }
}
