use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Shared defaults for every engine.
///
/// # Configuration Locations
///
/// Settings are layered, later sources overriding earlier ones:
/// 1. Global `$HOME/.config/scoutkit/config.yaml`
/// 2. Local `.scoutkit.yaml` in the current directory
/// 3. Custom file passed with `--config`
///
/// Command-line flags override all of them.
///
/// # Configuration Format
///
/// ```yaml
/// # Directory names pruned from every scan
/// exclude_dirs: [".git", "node_modules", "target"]
///
/// # Worker threads for tree scans (default: CPU cores)
/// thread_count: 8
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
///
/// # Search result cap
/// max_results: 100
///
/// # Context lines around diff hunks
/// context_lines: 3
///
/// # Files at or above this size are never hashed
/// hash_size_limit: 10485760
///
/// # Batch command execution
/// task_workers: 4
/// task_timeout_secs: 60
///
/// # Watch polling cadence
/// poll_interval_ms: 1000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoutConfig {
    /// Directory names that are never descended into
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    /// Number of worker threads used for tree scans
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Maximum number of search matches returned
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Context lines emitted before and after each diff change
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,

    /// Files of this size or larger are indexed without a content hash
    #[serde(default = "default_hash_size_limit")]
    pub hash_size_limit: u64,

    /// Number of commands run concurrently by the task runner
    #[serde(default = "default_task_workers")]
    pub task_workers: NonZeroUsize,

    /// Per-task deadline in seconds
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,

    /// Interval between two snapshots in live watch mode
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "__pycache__",
    "vendor",
    ".venv",
    "venv",
    "target",
];

fn default_exclude_dirs() -> Vec<String> {
    DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect()
}

pub fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_max_results() -> usize {
    100
}

fn default_context_lines() -> usize {
    3
}

fn default_hash_size_limit() -> u64 {
    10 * 1024 * 1024
}

fn default_task_workers() -> NonZeroUsize {
    NonZeroUsize::new(4).unwrap_or(NonZeroUsize::MIN)
}

fn default_task_timeout_secs() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: default_exclude_dirs(),
            thread_count: default_thread_count(),
            log_level: default_log_level(),
            max_results: default_max_results(),
            context_lines: default_context_lines(),
            hash_size_limit: default_hash_size_limit(),
            task_workers: default_task_workers(),
            task_timeout_secs: default_task_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ScoutConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration, layering `config_path` over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("scoutkit/config.yaml")),
            Some(PathBuf::from(".scoutkit.yaml")),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicit file must exist; the implicit ones are optional
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }
}
