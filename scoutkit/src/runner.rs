//! Bounded parallel execution of shell commands.
//!
//! Tasks are loaded from a JSON or YAML file, inline JSON, a command
//! template expanded over a file list, or newline-separated commands. Each
//! task runs through the platform shell under a per-task deadline; at most
//! `workers` run at once. A failing, crashing or timed-out task is recorded
//! in its own [`TaskResult`] and never affects the others.

use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::errors::{ScoutError, ScoutResult};
use crate::filters::split_list;

pub const TIMEOUT_MESSAGE: &str = "timeout exceeded";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub id: String,
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_ms: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResult {
    fn failed(task: &Task, error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            id: task.id.clone(),
            command: task.command.clone(),
            stdout: String::new(),
            stderr: String::new(),
            exit_code: -1,
            duration_ms: elapsed.as_millis() as u64,
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub results: Vec<TaskResult>,
    pub total_tasks: usize,
    pub success_count: usize,
    pub fail_count: usize,
    pub total_duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub workers: NonZeroUsize,
    pub timeout: Duration,
    /// Working directory for tasks that do not name one
    pub default_dir: PathBuf,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: NonZeroUsize::new(4).unwrap_or(NonZeroUsize::MIN),
            timeout: Duration::from_secs(60),
            default_dir: PathBuf::from("."),
        }
    }
}

/// Fills empty ids with `task_N`, N being the 1-based position
fn assign_ids(mut tasks: Vec<Task>) -> Vec<Task> {
    for (index, task) in tasks.iter_mut().enumerate() {
        if task.id.is_empty() {
            task.id = format!("task_{}", index + 1);
        }
    }
    tasks
}

/// Reads tasks from a file; `.yaml`/`.yml` files are parsed as YAML, anything else as JSON
pub fn load_tasks_file(path: &Path) -> ScoutResult<Vec<Task>> {
    let text = std::fs::read_to_string(path).map_err(|e| ScoutError::from_io(path, e))?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let tasks = if is_yaml {
        serde_yaml::from_str(&text)?
    } else {
        serde_json::from_str(&text)?
    };
    Ok(assign_ids(tasks))
}

/// Parses a JSON array of tasks given inline
pub fn parse_tasks_json(json: &str) -> ScoutResult<Vec<Task>> {
    Ok(assign_ids(serde_json::from_str(json)?))
}

/// One task per file, with `{file}` and `{}` replaced by the file name
pub fn tasks_from_template(template: &str, files: &str, dir: &Path) -> Vec<Task> {
    let tasks = split_list(files)
        .into_iter()
        .map(|file| Task {
            id: String::new(),
            command: template.replace("{file}", &file).replace("{}", &file),
            dir: Some(dir.to_path_buf()),
        })
        .collect();
    assign_ids(tasks)
}

/// One task per non-blank line; lines starting with `#` are comments
pub fn tasks_from_lines<R: BufRead>(reader: R, dir: &Path) -> ScoutResult<Vec<Task>> {
    let mut tasks = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        tasks.push(Task {
            id: String::new(),
            command: line.to_string(),
            dir: Some(dir.to_path_buf()),
        });
    }
    Ok(assign_ids(tasks))
}

fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}

async fn run_task(task: &Task, timeout: Duration, default_dir: &Path) -> TaskResult {
    let start = Instant::now();
    let dir = task.dir.as_deref().unwrap_or(default_dir);
    debug!("Starting {} in {}: {}", task.id, dir.display(), task.command);

    let mut cmd = shell_command(&task.command);
    cmd.current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Err(_) => {
            warn!("Task {} exceeded {:?}", task.id, timeout);
            return TaskResult::failed(task, TIMEOUT_MESSAGE, start.elapsed());
        }
        Ok(Err(e)) => return TaskResult::failed(task, e.to_string(), start.elapsed()),
        Ok(Ok(output)) => output,
    };

    let (exit_code, error) = match output.status.code() {
        Some(code) => (code, None),
        None => (-1, Some("terminated by signal".to_string())),
    };

    TaskResult {
        id: task.id.clone(),
        command: task.command.clone(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code,
        duration_ms: start.elapsed().as_millis() as u64,
        success: output.status.success() && error.is_none(),
        error,
    }
}

/// Runs every task with at most `options.workers` in flight; results keep input order
pub async fn run_tasks(tasks: Vec<Task>, options: &RunOptions) -> RunSummary {
    let start = Instant::now();
    info!(
        "Running {} tasks with {} workers",
        tasks.len(),
        options.workers
    );

    let semaphore = Arc::new(Semaphore::new(options.workers.get()));
    let mut workers = JoinSet::new();
    for (index, task) in tasks.iter().cloned().enumerate() {
        let semaphore = semaphore.clone();
        let timeout = options.timeout;
        let default_dir = options.default_dir.clone();
        workers.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            (index, run_task(&task, timeout, &default_dir).await)
        });
    }

    let mut slots: Vec<Option<TaskResult>> = vec![None; tasks.len()];
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => warn!("Task worker failed: {}", e),
        }
    }

    let results: Vec<TaskResult> = slots
        .into_iter()
        .zip(tasks.iter())
        .map(|(slot, task)| {
            slot.unwrap_or_else(|| TaskResult::failed(task, "task aborted", Duration::ZERO))
        })
        .collect();

    let success_count = results.iter().filter(|r| r.success).count();
    let summary = RunSummary {
        total_tasks: results.len(),
        success_count,
        fail_count: results.len() - success_count,
        total_duration_ms: start.elapsed().as_millis() as u64,
        results,
    };
    info!(
        "Tasks finished: {} ok, {} failed in {}ms",
        summary.success_count, summary.fail_count, summary.total_duration_ms
    );
    summary
}

/// Builds a multi-thread runtime and runs the tasks to completion
pub fn run_tasks_blocking(tasks: Vec<Task>, options: &RunOptions) -> ScoutResult<RunSummary> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(options.workers.get())
        .enable_all()
        .build()?;
    Ok(runtime.block_on(run_tasks(tasks, options)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn task(id: &str, command: &str) -> Task {
        Task {
            id: id.to_string(),
            command: command.to_string(),
            dir: None,
        }
    }

    #[test]
    fn test_tasks_from_template() {
        let tasks = tasks_from_template("wc -l {file} && echo {}", "a.py, b.py,,", Path::new("/src"));
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, "task_1");
        assert_eq!(tasks[0].command, "wc -l a.py && echo a.py");
        assert_eq!(tasks[1].command, "wc -l b.py && echo b.py");
        assert_eq!(tasks[1].dir.as_deref(), Some(Path::new("/src")));
    }

    #[test]
    fn test_tasks_from_lines_skips_comments() {
        let input = Cursor::new("# build\nmake\n\n   \nmake test\n");
        let tasks = tasks_from_lines(input, Path::new(".")).unwrap();
        let commands: Vec<_> = tasks.iter().map(|t| t.command.as_str()).collect();
        assert_eq!(commands, vec!["make", "make test"]);
        assert_eq!(tasks[1].id, "task_2");
    }

    #[test]
    fn test_parse_tasks_json_assigns_missing_ids() {
        let tasks =
            parse_tasks_json(r#"[{"id": "lint", "command": "true"}, {"command": "false"}]"#).unwrap();
        assert_eq!(tasks[0].id, "lint");
        assert_eq!(tasks[1].id, "task_2");
        assert!(parse_tasks_json("not json").is_err());
    }

    #[test]
    fn test_load_tasks_file_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.yml");
        fs::write(&path, "- id: one\n  command: echo 1\n- command: echo 2\n  dir: /tmp\n").unwrap();

        let tasks = load_tasks_file(&path).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].id, "task_2");
        assert_eq!(tasks[1].dir.as_deref(), Some(Path::new("/tmp")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_tasks_isolates_failures() {
        let options = RunOptions {
            timeout: Duration::from_secs(1),
            ..Default::default()
        };
        let tasks = vec![
            task("ok", "echo hello"),
            task("fail", "echo oops >&2; exit 3"),
            task("slow", "sleep 5"),
        ];

        let summary = run_tasks(tasks, &options).await;
        assert_eq!(summary.total_tasks, 3);
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.fail_count, 2);

        let ok = &summary.results[0];
        assert_eq!(ok.id, "ok");
        assert!(ok.success);
        assert_eq!(ok.exit_code, 0);
        assert_eq!(ok.stdout, "hello\n");

        let fail = &summary.results[1];
        assert!(!fail.success);
        assert_eq!(fail.exit_code, 3);
        assert_eq!(fail.stderr, "oops\n");
        assert!(fail.error.is_none());

        let slow = &summary.results[2];
        assert_eq!(slow.exit_code, -1);
        assert_eq!(slow.error.as_deref(), Some(TIMEOUT_MESSAGE));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_tasks_uses_working_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("marker.txt"), "").unwrap();
        let options = RunOptions {
            default_dir: dir.path().to_path_buf(),
            ..Default::default()
        };

        let summary = run_tasks(vec![task("ls", "ls")], &options).await;
        assert!(summary.results[0].stdout.contains("marker.txt"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_directory_is_a_spawn_error() {
        let mut t = task("nowhere", "true");
        t.dir = Some(PathBuf::from("/definitely/not/here"));

        let summary = run_tasks(vec![t], &RunOptions::default()).await;
        let result = &summary.results[0];
        assert!(!result.success);
        assert_eq!(result.exit_code, -1);
        assert!(result.error.is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_tasks_blocking() {
        let summary = run_tasks_blocking(vec![task("t", "exit 0")], &RunOptions::default()).unwrap();
        assert_eq!(summary.success_count, 1);
    }
}
