use anyhow::Result;
use clap::Parser;
use scoutkit::symbols::{resolve, ResolveOptions};
use scoutkit::ExtensionFilter;
use scoutkit_cli::{emit_json, exclude_dirs, CommonArgs};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Find the definition of a symbol and every reference to it
#[derive(Parser)]
#[command(name = "scout-resolve", author, version, about, long_about = None)]
struct Cli {
    /// Symbol to find
    #[arg(short, long)]
    symbol: String,

    /// Directory to search
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// File extensions to include (e.g. go,py)
    #[arg(short, long)]
    ext: Option<String>,

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

    let mut options = ResolveOptions::new(&cli.symbol, &cli.dir);
    options.extensions = cli.ext.as_deref().map(ExtensionFilter::parse).unwrap_or_default();
    options.exclude_dirs = exclude_dirs(cli.exclude.as_deref(), &config);
    options.thread_count = cli.threads.unwrap_or(config.thread_count);

    emit_json(&resolve(&options))
}
