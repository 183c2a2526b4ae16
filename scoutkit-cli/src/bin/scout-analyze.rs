use anyhow::Result;
use clap::Parser;
use scoutkit::symbols::{analyze_path, AnalyzeOptions, SymbolKind};
use scoutkit::ExtensionFilter;
use scoutkit_cli::{depth_limit, emit_json, exclude_dirs, CommonArgs};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Extract functions, classes, methods, variables and imports from source files
#[derive(Parser)]
#[command(name = "scout-analyze", author, version, about, long_about = None)]
struct Cli {
    /// File or directory to analyze
    #[arg(short, long)]
    path: PathBuf,

    /// File extensions to include (e.g. py,ts)
    #[arg(short, long)]
    ext: Option<String>,

    /// Only report symbols of this kind (function, method, class, import, variable)
    #[arg(short = 't', long = "type")]
    kind: Option<SymbolKind>,

    /// Maximum directory depth (-1 for unlimited)
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    depth: i64,

    /// Directories to exclude (comma-separated)
    #[arg(long)]
    exclude: Option<String>,

    /// Number of threads to use
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.common.setup()?;

    let mut options = AnalyzeOptions::new(&cli.path);
    options.extensions = cli.ext.as_deref().map(ExtensionFilter::parse).unwrap_or_default();
    options.kind = cli.kind;
    options.max_depth = depth_limit(cli.depth);
    options.exclude_dirs = exclude_dirs(cli.exclude.as_deref(), &config);
    options.thread_count = cli.threads.unwrap_or(config.thread_count);

    emit_json(&analyze_path(&options))
}
