use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use scoutkit::search::{search, SearchOptions};
use scoutkit::SearchOutput;
use scoutkit_cli::{emit_json, exclude_dirs, CommonArgs};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Search file contents for a literal string or regular expression
#[derive(Parser)]
#[command(name = "scout-search", author, version, about, long_about = None)]
struct Cli {
    /// Search pattern (string or regex)
    #[arg(short, long)]
    pattern: String,

    /// Directory to search
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Treat the pattern as a regular expression
    #[arg(short, long)]
    regex: bool,

    /// Case-insensitive search
    #[arg(short = 'i', long = "ignore-case")]
    ignore_case: bool,

    /// File name glob (e.g. '*.py')
    #[arg(short, long)]
    files: Option<String>,

    /// Maximum number of results
    #[arg(short, long)]
    max: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Colorize plain output
    #[arg(long)]
    color: bool,

    /// Directories to exclude (comma-separated)
    #[arg(long)]
    exclude: Option<String>,

    /// Number of threads to use
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    #[command(flatten)]
    common: CommonArgs,
}

fn print_plain(output: &SearchOutput, color: bool) {
    for m in &output.matches {
        if color {
            println!(
                "{}:{}: {}",
                m.file.display().to_string().blue(),
                m.line.to_string().green(),
                m.content.trim()
            );
        } else {
            println!("{}", m.to_plain());
        }
    }
    if let Some(error) = &output.error {
        eprintln!("Error: {}", error);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.common.setup()?;

    let mut options = SearchOptions::new(&cli.pattern, &cli.dir);
    options.is_regex = cli.regex;
    options.ignore_case = cli.ignore_case;
    options.file_glob = cli.files.unwrap_or_default();
    options.max_results = cli.max.unwrap_or(config.max_results);
    options.exclude_dirs = exclude_dirs(cli.exclude.as_deref(), &config);
    options.thread_count = cli.threads.unwrap_or(config.thread_count);

    let output = search(&options);
    if cli.json {
        emit_json(&output)
    } else {
        print_plain(&output, cli.color);
        Ok(())
    }
}
