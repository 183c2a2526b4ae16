use anyhow::Result;
use clap::Parser;
use scoutkit::git::{execute, GitMode, GitRequest, GitResult, MODE_REQUIRED};
use scoutkit_cli::{emit_json, CommonArgs};
use std::path::PathBuf;

/// Blame, history, diffs, status and branches of a git repository as JSON
#[derive(Parser)]
#[command(name = "scout-git", author, version, about, long_about = None)]
struct Cli {
    /// One of blame, log, diff, status, branches
    #[arg(short, long, default_value = "")]
    mode: String,

    /// File path (required for blame; narrows log and diff)
    #[arg(short, long)]
    file: Option<String>,

    /// Commit to diff against its parent
    #[arg(long)]
    commit: Option<String>,

    /// Number of commits for log
    #[arg(short = 'n', long, default_value_t = 10)]
    count: usize,

    /// Only commits more recent than this date (log)
    #[arg(long)]
    since: Option<String>,

    /// Repository path
    #[arg(short, long, default_value = ".")]
    repo: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.common.setup()?;

    let result = match cli.mode.parse::<GitMode>() {
        Ok(mode) => {
            let mut request = GitRequest::new(&cli.repo, mode);
            request.file = cli.file;
            request.commit = cli.commit;
            request.count = cli.count;
            request.since = cli.since;
            execute(&request)
        }
        Err(_) => GitResult::failed(&cli.mode, MODE_REQUIRED),
    };
    emit_json(&result)
}
