use anyhow::Result;
use clap::Parser;
use scoutkit::index::{index_directory, IndexOptions};
use scoutkit::ExtensionFilter;
use scoutkit_cli::{depth_limit, emit_json, exclude_dirs, CommonArgs};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// List files under a directory with size, extension, modification time and an optional MD5 hash
#[derive(Parser)]
#[command(name = "scout-index", author, version, about, long_about = None)]
struct Cli {
    /// Directory to index
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Calculate an MD5 hash for each file below the size limit
    #[arg(long)]
    hash: bool,

    /// File extensions to include (e.g. py,go,js)
    #[arg(short, long)]
    ext: Option<String>,

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

    let mut options = IndexOptions::new(&cli.dir);
    options.with_hash = cli.hash;
    options.extensions = cli.ext.as_deref().map(ExtensionFilter::parse).unwrap_or_default();
    options.max_depth = depth_limit(cli.depth);
    options.exclude_dirs = exclude_dirs(cli.exclude.as_deref(), &config);
    options.thread_count = cli.threads.unwrap_or(config.thread_count);
    options.hash_size_limit = config.hash_size_limit;

    emit_json(&index_directory(&options))
}
