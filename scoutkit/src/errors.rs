//! Error types shared by every engine.
//!
//! Engines distinguish two failure classes. Per-item failures (one unreadable
//! file, one task that exits non-zero) never surface here: they are skipped or
//! recorded on the item itself. A `ScoutError` is reserved for failures that
//! invalidate the whole invocation, such as a bad regular expression, an
//! ambiguous replacement target or a version-control command that failed.
//!
//! ```rust,ignore
//! match replace_unique(&target, "old", "new", ReplaceMode::Apply) {
//!     Ok(outcome) => // file written,
//!     Err(ScoutError::AmbiguousMatch { count }) => // ask for a longer snippet,
//!     Err(e) => // report e.to_string() in the JSON `error` field
//! }
//! ```
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for scoutkit operations
pub type ScoutResult<T> = Result<T, ScoutError>;

/// Errors that can abort an engine invocation
#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Text not found")]
    TextNotFound,
    #[error("Found {count} matches, need unique match")]
    AmbiguousMatch { count: usize },
    #[error("Patch does not apply: {0}")]
    PatchMismatch(String),
    #[error("{0}")]
    ExternalCommand(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl ScoutError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn ambiguous_match(count: usize) -> Self {
        Self::AmbiguousMatch { count }
    }

    pub fn patch_mismatch(msg: impl Into<String>) -> Self {
        Self::PatchMismatch(msg.into())
    }

    pub fn external_command(stderr: impl Into<String>) -> Self {
        Self::ExternalCommand(stderr.into())
    }

    /// Maps an I/O error on `path` to the most specific variant
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }
}
