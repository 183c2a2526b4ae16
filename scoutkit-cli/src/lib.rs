//! Plumbing shared by the `scout-*` binaries.
//!
//! Every binary prints exactly one JSON document on stdout (the watcher's
//! streaming mode prints one compact document per event). Diagnostics go to
//! stderr through `tracing`, so stdout stays machine-readable.

use anyhow::{Context, Result};
use clap::Args;
use scoutkit::filters::split_list;
use scoutkit::ScoutConfig;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Flags accepted by every binary
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Settings file layered over the default locations
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level for stderr diagnostics (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl CommonArgs {
    /// Loads settings and installs the stderr logger
    pub fn setup(&self) -> Result<ScoutConfig> {
        let config = ScoutConfig::load_from(self.config.as_deref()).with_context(|| match &self.config {
            Some(path) => format!("failed to load config from {}", path.display()),
            None => "failed to load config".to_string(),
        })?;
        init_logging(self.log_level.as_deref().unwrap_or(&config.log_level));
        Ok(config)
    }
}

/// Logs to stderr; `RUST_LOG` takes precedence over `level`
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second install (tests driving several entry points) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Prints a value as pretty JSON with a two-space indent
pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Prints a value as one compact JSON line and flushes it
pub fn emit_json_line<T: Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer(&mut out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Directory exclusions from a comma list flag, falling back to the configured defaults
pub fn exclude_dirs(flag: Option<&str>, config: &ScoutConfig) -> Vec<String> {
    match flag {
        Some(list) => split_list(list),
        None => config.exclude_dirs.clone(),
    }
}

/// Maps a signed depth flag to a limit; negative values mean unlimited
pub fn depth_limit(depth: i64) -> Option<usize> {
    usize::try_from(depth).ok()
}
