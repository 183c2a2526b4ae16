//! Two-way line diffs, unified patches and unique-substring replacement.
//!
//! Diffs are computed with Myers' algorithm (`similar`) over whole line
//! sequences, so both inputs are read completely before any hunk is built.
//! Hunks carry `context` unchanged lines on each side; two changes separated
//! by more than `2 * context` unchanged lines end up in separate hunks.
//!
//! Lines are compared without their terminators. A file that differs only
//! by its final newline therefore produces no hunks.
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use similar::algorithms::{myers, Capture, Replace};
use similar::{group_diff_ops, DiffOp, DiffTag};
use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::errors::{ScoutError, ScoutResult};

/// One tagged line of a hunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Removed(String),
    Added(String),
}

impl DiffLine {
    pub fn prefix(&self) -> char {
        match self {
            DiffLine::Context(_) => ' ',
            DiffLine::Removed(_) => '-',
            DiffLine::Added(_) => '+',
        }
    }

    pub fn text(&self) -> &str {
        match self {
            DiffLine::Context(t) | DiffLine::Removed(t) | DiffLine::Added(t) => t,
        }
    }

    /// Parses a patch body line; an empty line is an empty context line
    pub fn parse(raw: &str) -> Option<Self> {
        let mut chars = raw.chars();
        match chars.next() {
            None => Some(DiffLine::Context(String::new())),
            Some(' ') => Some(DiffLine::Context(chars.as_str().to_string())),
            Some('-') => Some(DiffLine::Removed(chars.as_str().to_string())),
            Some('+') => Some(DiffLine::Added(chars.as_str().to_string())),
            Some(_) => None,
        }
    }

    fn counts_old(&self) -> bool {
        !matches!(self, DiffLine::Added(_))
    }

    fn counts_new(&self) -> bool {
        !matches!(self, DiffLine::Removed(_))
    }
}

impl std::fmt::Display for DiffLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.prefix(), self.text())
    }
}

impl Serialize for DiffLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DiffLine {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DiffLine::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid diff line prefix: {:?}", raw)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        )
    }

    /// 0-based index in the old sequence where the hunk begins
    fn old_position(&self) -> Option<usize> {
        if self.old_count == 0 {
            Some(self.old_start)
        } else {
            self.old_start.checked_sub(1)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub old_file: PathBuf,
    pub new_file: PathBuf,
    pub hunks: Vec<DiffHunk>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<FileDiff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiffResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Outcome of a replace, preview or patch application on one file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyResult {
    pub success: bool,
    pub file_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApplyResult {
    pub fn failed(file_path: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            file_path: file_path.into(),
            content: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceMode {
    /// Return the would-be content without writing
    Preview,
    /// Write the new content to the file
    Apply,
}

/// Runs Myers over two line slices, merging adjacent delete/insert pairs
fn diff_ops(old: &[&str], new: &[&str]) -> Vec<DiffOp> {
    let mut hook = Replace::new(Capture::default());
    if let Err(never) = myers::diff(&mut hook, old, 0..old.len(), new, 0..new.len()) {
        match never {}
    }
    sequential(hook.into_inner().into_ops())
}

/// Re-derives every op's indices from the lengths of the ops before it
fn sequential(ops: Vec<DiffOp>) -> Vec<DiffOp> {
    let (mut old_index, mut new_index) = (0, 0);
    ops.into_iter()
        .map(|op| {
            let (old_len, new_len) = (op.old_range().len(), op.new_range().len());
            let fixed = match op.tag() {
                DiffTag::Equal => DiffOp::Equal {
                    old_index,
                    new_index,
                    len: old_len,
                },
                DiffTag::Delete => DiffOp::Delete {
                    old_index,
                    old_len,
                    new_index,
                },
                DiffTag::Insert => DiffOp::Insert {
                    old_index,
                    new_index,
                    new_len,
                },
                DiffTag::Replace => DiffOp::Replace {
                    old_index,
                    old_len,
                    new_index,
                    new_len,
                },
            };
            old_index += old_len;
            new_index += new_len;
            fixed
        })
        .collect()
}

/// Computes context hunks turning `old` into `new`
pub fn compute_hunks<S: AsRef<str>>(old: &[S], new: &[S], context: usize) -> Vec<DiffHunk> {
    let old: Vec<&str> = old.iter().map(|l| l.as_ref()).collect();
    let new: Vec<&str> = new.iter().map(|l| l.as_ref()).collect();
    // Wider context than either input cannot change the grouping
    let context = context.min(old.len().max(new.len()));
    let ops = diff_ops(&old, &new);

    let mut hunks = Vec::new();
    for group in group_diff_ops(ops, context) {
        let Some(first) = group.first() else {
            continue;
        };
        let old_begin = first.old_range().start;
        let new_begin = first.new_range().start;
        let old_count: usize = group.iter().map(|op| op.old_range().len()).sum();
        let new_count: usize = group.iter().map(|op| op.new_range().len()).sum();

        let mut lines = Vec::with_capacity(old_count.max(new_count));
        for op in &group {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            match tag {
                DiffTag::Equal => {
                    lines.extend(old[old_range].iter().map(|l| DiffLine::Context(l.to_string())))
                }
                DiffTag::Delete => {
                    lines.extend(old[old_range].iter().map(|l| DiffLine::Removed(l.to_string())))
                }
                DiffTag::Insert => {
                    lines.extend(new[new_range].iter().map(|l| DiffLine::Added(l.to_string())))
                }
                DiffTag::Replace => {
                    lines.extend(old[old_range].iter().map(|l| DiffLine::Removed(l.to_string())));
                    lines.extend(new[new_range].iter().map(|l| DiffLine::Added(l.to_string())));
                }
            }
        }

        // An empty range is anchored on the line before it
        hunks.push(DiffHunk {
            old_start: if old_count == 0 { old_begin } else { old_begin + 1 },
            old_count,
            new_start: if new_count == 0 { new_begin } else { new_begin + 1 },
            new_count,
            lines,
        });
    }
    hunks
}

/// Renders hunks as a unified patch
pub fn render_patch(old_label: &str, new_label: &str, hunks: &[DiffHunk]) -> String {
    let mut patch = String::new();
    let _ = writeln!(patch, "--- {}", old_label);
    let _ = writeln!(patch, "+++ {}", new_label);
    for hunk in hunks {
        let _ = writeln!(patch, "{}", hunk.header());
        for line in &hunk.lines {
            let _ = writeln!(patch, "{}", line);
        }
    }
    patch
}

fn parse_range(raw: &str) -> Option<(usize, usize)> {
    match raw.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((raw.parse().ok()?, 1)),
    }
}

fn parse_header(line: &str) -> Option<(usize, usize, usize, usize)> {
    let rest = line.strip_prefix("@@ -")?;
    let (old, rest) = rest.split_once(" +")?;
    let (new, _) = rest.split_once(" @@")?;
    let (old_start, old_count) = parse_range(old)?;
    let (new_start, new_count) = parse_range(new)?;
    Some((old_start, old_count, new_start, new_count))
}

/// Parses the hunks of a unified patch; file headers and other preamble are ignored
pub fn parse_patch(patch: &str) -> ScoutResult<Vec<DiffHunk>> {
    let mut hunks = Vec::new();
    let mut lines = patch.lines().enumerate().peekable();

    while let Some((index, line)) = lines.next() {
        if !line.starts_with("@@") {
            continue;
        }
        let (old_start, old_count, new_start, new_count) = parse_header(line).ok_or_else(|| {
            ScoutError::patch_mismatch(format!("malformed hunk header at line {}", index + 1))
        })?;

        let mut hunk = DiffHunk {
            old_start,
            old_count,
            new_start,
            new_count,
            lines: Vec::new(),
        };
        let (mut old_seen, mut new_seen) = (0, 0);
        while old_seen < old_count || new_seen < new_count {
            let Some((body_index, raw)) = lines.next() else {
                return Err(ScoutError::patch_mismatch("patch ends inside a hunk"));
            };
            if raw.starts_with('\\') {
                continue;
            }
            let line = DiffLine::parse(raw).ok_or_else(|| {
                ScoutError::patch_mismatch(format!("unexpected line {} in hunk", body_index + 1))
            })?;
            old_seen += usize::from(line.counts_old());
            new_seen += usize::from(line.counts_new());
            hunk.lines.push(line);
        }
        if old_seen != old_count || new_seen != new_count {
            return Err(ScoutError::patch_mismatch(format!(
                "hunk {} line counts do not match its header",
                hunk.header()
            )));
        }

        // Trailing "\ No newline at end of file" markers
        while lines.peek().is_some_and(|(_, l)| l.starts_with('\\')) {
            lines.next();
        }
        hunks.push(hunk);
    }
    Ok(hunks)
}

/// Applies hunks to a line sequence, verifying every context and removed line
pub fn apply_hunks<S: AsRef<str>>(old: &[S], hunks: &[DiffHunk]) -> ScoutResult<Vec<String>> {
    let mut out = Vec::with_capacity(old.len());
    let mut cursor = 0;

    for hunk in hunks {
        let position = hunk
            .old_position()
            .filter(|&p| p >= cursor && p <= old.len())
            .ok_or_else(|| ScoutError::patch_mismatch(format!("{} is out of order", hunk.header())))?;
        out.extend(old[cursor..position].iter().map(|l| l.as_ref().to_string()));
        cursor = position;

        for line in &hunk.lines {
            match line {
                DiffLine::Added(text) => out.push(text.clone()),
                DiffLine::Context(text) | DiffLine::Removed(text) => {
                    let actual: Option<&str> = old.get(cursor).map(|l| l.as_ref());
                    if actual != Some(text.as_str()) {
                        return Err(ScoutError::patch_mismatch(format!(
                            "line {} expected {:?}, found {:?}",
                            cursor + 1,
                            text,
                            actual.unwrap_or("<end of file>")
                        )));
                    }
                    if let DiffLine::Context(_) = line {
                        out.push(text.clone());
                    }
                    cursor += 1;
                }
            }
        }
    }

    out.extend(old[cursor..].iter().map(|l| l.as_ref().to_string()));
    Ok(out)
}

fn read_lines(path: &Path) -> ScoutResult<Vec<String>> {
    let content = fs::read(path).map_err(|e| ScoutError::from_io(path, e))?;
    Ok(String::from_utf8_lossy(&content)
        .lines()
        .map(str::to_string)
        .collect())
}

/// Diffs two files and renders the unified patch
pub fn diff_files(old_path: &Path, new_path: &Path, context: usize) -> DiffResult {
    info!(
        "Diffing {} against {}",
        old_path.display(),
        new_path.display()
    );
    let (old, new) = match (read_lines(old_path), read_lines(new_path)) {
        (Ok(old), Ok(new)) => (old, new),
        (Err(e), _) | (_, Err(e)) => return DiffResult::failed(e.to_string()),
    };

    let hunks = compute_hunks(&old, &new, context);
    debug!("Diff produced {} hunks", hunks.len());
    let patch = render_patch(
        &old_path.display().to_string(),
        &new_path.display().to_string(),
        &hunks,
    );

    DiffResult {
        success: true,
        diff: Some(FileDiff {
            old_file: old_path.to_path_buf(),
            new_file: new_path.to_path_buf(),
            hunks,
        }),
        patch: Some(patch),
        error: None,
    }
}

/// Writes `content` next to `path` and renames it into place, keeping permissions
fn write_atomic(path: &Path, content: &str) -> ScoutResult<()> {
    let permissions = fs::metadata(path)
        .map_err(|e| ScoutError::from_io(path, e))?
        .permissions();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    fs::set_permissions(tmp.path(), permissions)?;
    tmp.persist(path).map_err(|e| ScoutError::IoError(e.error))?;
    Ok(())
}

/// Replaces the single occurrence of `old_text` in a file.
///
/// Fails without touching the file when `old_text` is empty, absent, or
/// occurs more than once. Returns the new content.
pub fn replace_unique(
    path: &Path,
    old_text: &str,
    new_text: &str,
    mode: ReplaceMode,
) -> ScoutResult<String> {
    if old_text.is_empty() {
        return Err(ScoutError::config_error("old text must not be empty"));
    }
    let content = fs::read_to_string(path).map_err(|e| ScoutError::from_io(path, e))?;

    match content.matches(old_text).count() {
        0 => return Err(ScoutError::TextNotFound),
        1 => {}
        count => return Err(ScoutError::ambiguous_match(count)),
    }

    let updated = content.replacen(old_text, new_text, 1);
    if mode == ReplaceMode::Apply {
        write_atomic(path, &updated)?;
        info!("Replaced text in {}", path.display());
    }
    Ok(updated)
}

/// Replace or preview, shaped for JSON output
pub fn replace_in_file(path: &Path, old_text: &str, new_text: &str, mode: ReplaceMode) -> ApplyResult {
    match replace_unique(path, old_text, new_text, mode) {
        Ok(content) => ApplyResult {
            success: true,
            file_path: path.to_path_buf(),
            content: (mode == ReplaceMode::Preview).then_some(content),
            error: None,
        },
        Err(e) => ApplyResult::failed(path, e.to_string()),
    }
}

/// Applies a unified patch to `target`.
///
/// The result keeps the target's trailing-newline convention. Nothing is
/// written unless every hunk applies cleanly.
pub fn apply_patch(target: &Path, patch: &str, mode: ReplaceMode) -> ApplyResult {
    let outcome = (|| -> ScoutResult<String> {
        let hunks = parse_patch(patch)?;
        let original = fs::read_to_string(target).map_err(|e| ScoutError::from_io(target, e))?;
        let old: Vec<&str> = original.lines().collect();
        let patched = apply_hunks(&old, &hunks)?;

        let mut content = patched.join("\n");
        if !patched.is_empty() && (original.is_empty() || original.ends_with('\n')) {
            content.push('\n');
        }
        if mode == ReplaceMode::Apply {
            write_atomic(target, &content)?;
        }
        Ok(content)
    })();

    match outcome {
        Ok(content) => ApplyResult {
            success: true,
            file_path: target.to_path_buf(),
            content: (mode == ReplaceMode::Preview).then_some(content),
            error: None,
        },
        Err(e) => ApplyResult::failed(target, e.to_string()),
    }
}
