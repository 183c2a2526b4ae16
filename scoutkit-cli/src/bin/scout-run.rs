use anyhow::Result;
use clap::Parser;
use scoutkit::runner::{
    load_tasks_file, parse_tasks_json, run_tasks, tasks_from_lines, tasks_from_template,
    RunOptions, Task,
};
use scoutkit::ScoutResult;
use scoutkit_cli::{emit_json, CommonArgs};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

/// Run shell commands in parallel and collect their output
#[derive(Parser)]
#[command(name = "scout-run", author, version, about, long_about = None)]
struct Cli {
    /// JSON or YAML file containing tasks
    #[arg(long)]
    tasks: Option<PathBuf>,

    /// Inline JSON array of tasks
    #[arg(long)]
    json: Option<String>,

    /// Command template with a {file} placeholder
    #[arg(long)]
    cmd: Option<String>,

    /// Comma-separated files substituted into --cmd
    #[arg(long)]
    files: Option<String>,

    /// Working directory
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Max parallel workers (0 = configured default)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Timeout per task in seconds
    #[arg(long)]
    timeout: Option<u64>,

    #[command(flatten)]
    common: CommonArgs,
}

impl Cli {
    fn load_tasks(&self) -> ScoutResult<Vec<Task>> {
        if let Some(path) = &self.tasks {
            return load_tasks_file(path);
        }
        if let Some(json) = &self.json {
            return parse_tasks_json(json);
        }
        if let (Some(cmd), Some(files)) = (&self.cmd, &self.files) {
            return Ok(tasks_from_template(cmd, files, &self.dir));
        }
        tasks_from_lines(std::io::stdin().lock(), &self.dir)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.common.setup()?;

    let tasks = cli.load_tasks().unwrap_or_else(|e| {
        eprintln!("Error loading tasks: {}", e);
        Vec::new()
    });
    if tasks.is_empty() {
        eprintln!("Error: No tasks to run");
        std::process::exit(1);
    }

    let options = RunOptions {
        workers: cli
            .workers
            .and_then(NonZeroUsize::new)
            .unwrap_or(config.task_workers),
        timeout: Duration::from_secs(cli.timeout.unwrap_or(config.task_timeout_secs)),
        default_dir: cli.dir.clone(),
    };

    emit_json(&run_tasks(tasks, &options).await)
}
