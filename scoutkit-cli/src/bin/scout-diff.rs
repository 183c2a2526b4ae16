use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use scoutkit::diff::{apply_patch, diff_files, replace_in_file, ApplyResult, DiffResult, ReplaceMode};
use scoutkit_cli::{emit_json, CommonArgs};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Compare two files and produce hunks plus a unified patch
    Diff,
    /// Replace one unique occurrence of text and write the file
    Apply,
    /// Show the content a replacement would produce
    Preview,
    /// Apply a unified patch to a file
    Patch,
}

/// Line diffs, unified patches and exact single-occurrence replacement
#[derive(Parser)]
#[command(name = "scout-diff", author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, value_enum, default_value_t = Mode::Diff)]
    mode: Mode,

    /// Old file (diff mode)
    #[arg(long)]
    old: Option<PathBuf>,

    /// New file (diff mode)
    #[arg(long)]
    new: Option<PathBuf>,

    /// Context lines around each change
    #[arg(short = 'U', long)]
    context: Option<usize>,

    /// File to modify (apply, preview and patch modes)
    #[arg(short, long)]
    target: Option<PathBuf>,

    /// Text to replace; must occur exactly once
    #[arg(long)]
    old_text: Option<String>,

    /// Replacement text
    #[arg(long, default_value = "")]
    new_text: String,

    /// Unified patch file (patch mode)
    #[arg(long)]
    patch: Option<PathBuf>,

    /// Report the patched content instead of writing it (patch mode)
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.common.setup()?;

    match cli.mode {
        Mode::Diff => {
            let result = match (&cli.old, &cli.new) {
                (Some(old), Some(new)) => {
                    diff_files(old, new, cli.context.unwrap_or(config.context_lines))
                }
                _ => DiffResult::failed("--old and --new required"),
            };
            emit_json(&result)
        }
        Mode::Apply | Mode::Preview => {
            let replace_mode = if cli.mode == Mode::Apply {
                ReplaceMode::Apply
            } else {
                ReplaceMode::Preview
            };
            let result = match (&cli.target, &cli.old_text) {
                (Some(target), Some(old_text)) if !old_text.is_empty() => {
                    replace_in_file(target, old_text, &cli.new_text, replace_mode)
                }
                (target, _) => ApplyResult::failed(
                    target.clone().unwrap_or_default(),
                    "--target and --old-text required",
                ),
            };
            emit_json(&result)
        }
        Mode::Patch => {
            let result = match (&cli.target, &cli.patch) {
                (Some(target), Some(patch_file)) => {
                    let patch = std::fs::read_to_string(patch_file)
                        .with_context(|| format!("failed to read {}", patch_file.display()));
                    match patch {
                        Ok(patch) => {
                            let mode = if cli.dry_run {
                                ReplaceMode::Preview
                            } else {
                                ReplaceMode::Apply
                            };
                            apply_patch(target, &patch, mode)
                        }
                        Err(e) => ApplyResult::failed(target, format!("{:#}", e)),
                    }
                }
                (target, _) => ApplyResult::failed(
                    target.clone().unwrap_or_default(),
                    "--target and --patch required",
                ),
            };
            emit_json(&result)
        }
    }
}
