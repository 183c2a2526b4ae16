//! Thin wrapper over the `git` executable.
//!
//! Each mode runs one git command inside the repository and reshapes its
//! output. Parsing is kept in pure functions over the captured text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

use crate::errors::{ScoutError, ScoutResult};

pub const MODE_REQUIRED: &str = "Mode required: blame, log, diff, status, branches";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitMode {
    Blame,
    Log,
    Diff,
    Status,
    Branches,
}

impl GitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GitMode::Blame => "blame",
            GitMode::Log => "log",
            GitMode::Diff => "diff",
            GitMode::Status => "status",
            GitMode::Branches => "branches",
        }
    }
}

impl fmt::Display for GitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GitMode {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blame" => Ok(GitMode::Blame),
            "log" => Ok(GitMode::Log),
            "diff" => Ok(GitMode::Diff),
            "status" => Ok(GitMode::Status),
            "branches" => Ok(GitMode::Branches),
            _ => Err(ScoutError::config_error(MODE_REQUIRED)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlameLine {
    pub line: usize,
    pub commit: String,
    pub author: String,
    pub date: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub hash: String,
    pub author: String,
    pub date: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub file: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitResult {
    pub success: bool,
    pub mode: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blame: Vec<BlameLine>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commits: Vec<CommitInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<FileChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GitResult {
    pub fn failed(mode: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitRequest {
    pub repo: PathBuf,
    pub mode: GitMode,
    pub file: Option<String>,
    pub commit: Option<String>,
    pub count: usize,
    pub since: Option<String>,
}

impl GitRequest {
    pub fn new(repo: impl Into<PathBuf>, mode: GitMode) -> Self {
        Self {
            repo: repo.into(),
            mode,
            file: None,
            commit: None,
            count: 10,
            since: None,
        }
    }
}

/// Runs git in `repo` and returns stdout; a non-zero exit carries git's stderr
pub fn run_git<S: AsRef<str>>(repo: &Path, args: &[S]) -> ScoutResult<String> {
    let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
    debug!("git {} (in {})", args.join(" "), repo.display());

    let output = Command::new("git")
        .args(&args)
        .current_dir(repo)
        .stdin(Stdio::null())
        .output()?;

    if !output.status.success() {
        return Err(ScoutError::external_command(
            String::from_utf8_lossy(&output.stderr).trim_end(),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub fn execute(request: &GitRequest) -> GitResult {
    info!("git {} in {}", request.mode, request.repo.display());
    let mode = request.mode.as_str();

    let outcome = match request.mode {
        GitMode::Blame => blame(request),
        GitMode::Log => log(request),
        GitMode::Diff => diff(request),
        GitMode::Status => run_git(&request.repo, &["status", "--porcelain"]).map(|out| GitResult {
            status: parse_status(&out),
            ..Default::default()
        }),
        GitMode::Branches => run_git(&request.repo, &["branch", "-a"]).map(|out| GitResult {
            branches: parse_branches(&out),
            ..Default::default()
        }),
    };

    match outcome {
        Ok(result) => GitResult {
            success: true,
            mode: mode.to_string(),
            ..result
        },
        Err(e) => GitResult::failed(mode, e.to_string()),
    }
}

fn blame(request: &GitRequest) -> ScoutResult<GitResult> {
    let file = request
        .file
        .as_deref()
        .ok_or_else(|| ScoutError::config_error("--file required"))?;
    let out = run_git(&request.repo, &["blame", "--line-porcelain", file])?;
    Ok(GitResult {
        blame: parse_blame_porcelain(&out),
        ..Default::default()
    })
}

fn log(request: &GitRequest) -> ScoutResult<GitResult> {
    let mut args = vec![
        "log".to_string(),
        format!("-n{}", request.count),
        "--pretty=format:%H|%an|%aI|%s".to_string(),
    ];
    if let Some(since) = &request.since {
        args.push("--since".to_string());
        args.push(since.clone());
    }
    if let Some(file) = &request.file {
        args.push("--".to_string());
        args.push(file.clone());
    }
    let out = run_git(&request.repo, &args)?;
    Ok(GitResult {
        commits: parse_log(&out),
        ..Default::default()
    })
}

fn diff(request: &GitRequest) -> ScoutResult<GitResult> {
    let mut args = vec!["diff".to_string()];
    if let Some(commit) = &request.commit {
        args.push(format!("{}^", commit));
        args.push(commit.clone());
    }
    if let Some(file) = &request.file {
        args.push("--".to_string());
        args.push(file.clone());
    }
    let out = run_git(&request.repo, &args)?;
    Ok(GitResult {
        diff: Some(out),
        ..Default::default()
    })
}

fn short(text: &str, len: usize) -> String {
    text.get(..len).unwrap_or(text).to_string()
}

fn is_commit_header(line: &str) -> bool {
    line.len() >= 40 && line.as_bytes()[..40].iter().all(|b| b.is_ascii_hexdigit())
}

/// Formats a unix timestamp as a UTC calendar date
fn unix_date(secs: u64) -> String {
    let time = SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
    short(&humantime::format_rfc3339_seconds(time).to_string(), 10)
}

/// Parses `git blame --line-porcelain` output, one entry per source line
pub fn parse_blame_porcelain(output: &str) -> Vec<BlameLine> {
    let mut lines = Vec::new();
    let mut current: Option<BlameLine> = None;

    for raw in output.lines() {
        if is_commit_header(raw) {
            lines.extend(current.take());
            let mut parts = raw.split_whitespace();
            let commit = parts.next().map(|h| short(h, 8)).unwrap_or_default();
            let line = parts.nth(1).and_then(|n| n.parse().ok()).unwrap_or(0);
            current = Some(BlameLine {
                line,
                commit,
                author: String::new(),
                date: String::new(),
                text: String::new(),
            });
            continue;
        }

        let Some(entry) = current.as_mut() else {
            continue;
        };
        if let Some(text) = raw.strip_prefix('\t') {
            entry.text = text.to_string();
        } else if let Some(author) = raw.strip_prefix("author ") {
            entry.author = author.to_string();
        } else if let Some(ts) = raw.strip_prefix("author-time ") {
            if let Ok(secs) = ts.trim().parse() {
                entry.date = unix_date(secs);
            }
        }
    }

    lines.extend(current);
    lines
}

/// Parses `%H|%an|%aI|%s` log lines
pub fn parse_log(output: &str) -> Vec<CommitInfo> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(4, '|');
            let hash = parts.next()?;
            let author = parts.next()?;
            let date = parts.next()?;
            let message = parts.next()?;
            Some(CommitInfo {
                hash: short(hash, 8),
                author: author.to_string(),
                date: short(date, 10),
                message: message.to_string(),
            })
        })
        .collect()
}

/// Parses `git status --porcelain` lines into file changes
pub fn parse_status(output: &str) -> Vec<FileChange> {
    output
        .lines()
        .filter(|line| line.len() >= 4)
        .map(|line| {
            let (code, path) = line.split_at(3);
            let flag = code.trim().chars().next().unwrap_or(' ');
            let status = match flag {
                'A' => "added",
                'D' => "deleted",
                '?' => "untracked",
                'R' => "renamed",
                _ => "modified",
            };
            let file = match path.split_once(" -> ") {
                Some((_, renamed_to)) => renamed_to,
                None => path,
            };
            FileChange {
                file: file.trim().to_string(),
                status: status.to_string(),
            }
        })
        .collect()
}

/// Parses `git branch -a`, dropping the current-branch marker
pub fn parse_branches(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| line.trim_start_matches("* ").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
