use anyhow::Result;
use scoutkit::diff::{
    apply_hunks, compute_hunks, parse_patch, render_patch, replace_in_file, DiffLine, ReplaceMode,
};
use scoutkit::index::{index_directory, IndexOptions, IndexResult};
use scoutkit::runner::{run_tasks_blocking, RunOptions, Task, TIMEOUT_MESSAGE};
use scoutkit::search::{search, SearchOptions};
use scoutkit::symbols::{analyze_path, resolve, AnalyzeOptions, ResolveOptions, SymbolKind};
use scoutkit::watch::{capture_snapshot, compare, EventKind};
use scoutkit::ExtensionFilter;
use std::collections::BTreeSet;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;

fn create_test_files(dir: &Path, files: &[(&str, &str)]) -> Result<()> {
    for (name, content) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
    }
    Ok(())
}

fn sample_tree(dir: &Path) -> Result<()> {
    create_test_files(
        dir,
        &[
            ("main.py", "import os\n\nclass App:\n    def run(self):\n        pass\n"),
            ("lib/util.go", "package lib\n\nfunc Helper() int {\n\treturn 1\n}\n"),
            ("lib/web/index.ts", "export function render(): void {}\n"),
            ("README.md", "# sample\n"),
            ("node_modules/dep/index.js", "module.exports = 1;\n"),
            ("build/out.py", "x = 1\n"),
        ],
    )
}

#[test]
fn test_index_is_idempotent() -> Result<()> {
    let dir = tempdir()?;
    sample_tree(dir.path())?;

    let mut options = IndexOptions::new(dir.path());
    options.with_hash = true;

    let strip = |result: &IndexResult| -> Result<serde_json::Value> {
        let mut value = serde_json::to_value(result)?;
        value.as_object_mut().unwrap().remove("duration");
        Ok(value)
    };
    let first = strip(&index_directory(&options))?;
    let second = strip(&index_directory(&options))?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_analyze_is_idempotent() -> Result<()> {
    let dir = tempdir()?;
    sample_tree(dir.path())?;

    let options = AnalyzeOptions::new(dir.path());
    let first = serde_json::to_value(analyze_path(&options))?;
    let second = serde_json::to_value(analyze_path(&options))?;
    assert_eq!(first, second);
    assert_eq!(first["total_files"], 4);
    Ok(())
}

#[test]
fn test_index_completeness() -> Result<()> {
    let dir = tempdir()?;
    sample_tree(dir.path())?;

    let mut options = IndexOptions::new(dir.path());
    options.extensions = ExtensionFilter::parse("py,.GO");
    options.exclude_dirs.push("build".to_string());
    let result = index_directory(&options);

    let indexed: Vec<PathBuf> = result.files.iter().map(|f| f.path.clone()).collect();
    let unique: BTreeSet<&PathBuf> = indexed.iter().collect();
    assert_eq!(unique.len(), indexed.len());

    let expected: BTreeSet<PathBuf> = ["main.py", "lib/util.go"]
        .iter()
        .map(|p| dir.path().join(p))
        .collect();
    assert_eq!(indexed.into_iter().collect::<BTreeSet<_>>(), expected);
    assert_eq!(result.total_files, 2);
    Ok(())
}

#[test]
fn test_search_cap_is_subset_of_uncapped() -> Result<()> {
    let dir = tempdir()?;
    for i in 0..20 {
        create_test_files(
            dir.path(),
            &[(&format!("f{:02}.txt", i), "needle one\nhay\nneedle two\n")],
        )?;
    }

    let mut options = SearchOptions::new("needle", dir.path());
    options.thread_count = NonZeroUsize::new(4).unwrap();
    options.max_results = usize::MAX;
    let all = search(&options);
    assert_eq!(all.count, 40);

    for cap in [0, 1, 7, 39, 40, 100] {
        options.max_results = cap;
        let capped = search(&options);
        assert!(capped.count <= cap);
        assert_eq!(capped.count, capped.matches.len());
        for m in &capped.matches {
            assert!(all.matches.contains(m));
        }
    }
    Ok(())
}

#[test]
fn test_resolve_definition_never_in_references() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(
        dir.path(),
        &[
            ("a.py", "def handler(event):\n    return handler\n"),
            ("b.go", "func handler() {}\n\nvar x = handler\n"),
            ("c.ts", "const handler = () => 1;\nhandler();\n"),
        ],
    )?;

    let result = resolve(&ResolveOptions::new("handler", dir.path()));
    let symbol = &result.symbols[0];
    let definition = symbol.definition.as_ref().unwrap();
    assert!(!symbol.references.contains(definition));
    assert_eq!(result.total_refs, symbol.references.len());
    assert_eq!(result.total_refs, 5);
    Ok(())
}

#[test]
fn test_end_to_end_foo() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(dir.path(), &[("a.py", "def foo(): pass\n"), ("b.py", "foo()\n")])?;

    let result = resolve(&ResolveOptions::new("foo", dir.path()));
    assert!(result.error.is_none());
    assert_eq!(result.total_refs, 1);

    let symbol = &result.symbols[0];
    assert_eq!(symbol.kind, Some(SymbolKind::Function));
    let definition = symbol.definition.as_ref().unwrap();
    assert_eq!(definition.file, dir.path().join("a.py"));
    assert_eq!(definition.line, 1);
    assert_eq!(symbol.references[0].file, dir.path().join("b.py"));
    assert_eq!(symbol.references[0].line, 1);
    Ok(())
}

/// Small deterministic generator for line sequences
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn lines(&mut self, max_len: u64) -> Vec<String> {
        let len = self.next() % (max_len + 1);
        (0..len).map(|_| format!("line {}", self.next() % 6)).collect()
    }
}

fn assert_round_trip(old: &[String], new: &[String], context: usize) -> Result<()> {
    let hunks = compute_hunks(old, new, context);
    for hunk in &hunks {
        let removed = hunk.lines.iter().filter(|l| matches!(l, DiffLine::Removed(_))).count();
        let added = hunk.lines.iter().filter(|l| matches!(l, DiffLine::Added(_))).count();
        let context_lines = hunk.lines.len() - removed - added;
        assert_eq!(context_lines + removed, hunk.old_count, "{}", hunk.header());
        assert_eq!(context_lines + added, hunk.new_count, "{}", hunk.header());
    }
    let patch = render_patch("a", "b", &hunks);
    let parsed = parse_patch(&patch)?;
    assert_eq!(parsed, hunks);
    assert_eq!(apply_hunks(old, &parsed)?, new, "patch:\n{}", patch);
    Ok(())
}

#[test]
fn test_diff_round_trip() -> Result<()> {
    let lines = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
    let fixed = [
        (lines(&[]), lines(&[])),
        (lines(&[]), lines(&["a", "b"])),
        (lines(&["a", "b"]), lines(&[])),
        (lines(&["a", "b", "c"]), lines(&["a", "b", "c", "d", "e"])),
        (lines(&["a", "b", "c", "d"]), lines(&["a", "b"])),
        (lines(&["x"]), lines(&["y"])),
    ];
    for (old, new) in &fixed {
        for context in [0, 1, 3] {
            assert_round_trip(old, new, context)?;
        }
    }

    let mut rng = Lcg(42);
    for _ in 0..200 {
        let old = rng.lines(30);
        let new = rng.lines(30);
        let context = (rng.next() % 4) as usize;
        assert_round_trip(&old, &new, context)?;
    }
    Ok(())
}

#[test]
fn test_snapshot_symmetry() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(dir.path(), &[("stay.txt", "1"), ("go.txt", "2"), ("edit.txt", "3")])?;
    let filter = ExtensionFilter::any();
    let first = capture_snapshot(dir.path(), &filter, &[])?;
    assert!(compare(&first, &first).is_empty());

    fs::remove_file(dir.path().join("go.txt"))?;
    fs::write(dir.path().join("new.txt"), "4")?;
    let mut second = capture_snapshot(dir.path(), &filter, &[])?;
    // Force a visible mtime change without depending on filesystem granularity
    let edited = second.get_mut(&dir.path().join("edit.txt")).unwrap();
    edited.mod_time += Duration::from_secs(5);

    let forward = compare(&first, &second);
    let backward = compare(&second, &first);
    let kinds = |events: &[scoutkit::watch::FileEvent]| -> Vec<(PathBuf, EventKind)> {
        events.iter().map(|e| (e.path.clone(), e.kind)).collect()
    };

    assert_eq!(
        kinds(&forward),
        vec![
            (dir.path().join("edit.txt"), EventKind::Modified),
            (dir.path().join("go.txt"), EventKind::Deleted),
            (dir.path().join("new.txt"), EventKind::Created),
        ]
    );
    assert_eq!(
        kinds(&backward),
        vec![
            (dir.path().join("edit.txt"), EventKind::Modified),
            (dir.path().join("go.txt"), EventKind::Created),
            (dir.path().join("new.txt"), EventKind::Deleted),
        ]
    );
    Ok(())
}

#[test]
fn test_replace_ambiguity_never_mutates() -> Result<()> {
    let dir = tempdir()?;
    let target = dir.path().join("twice.py");
    fs::write(&target, "print('x')\nprint('x')\n")?;

    for mode in [ReplaceMode::Preview, ReplaceMode::Apply] {
        let result = replace_in_file(&target, "print('x')", "print('y')", mode);
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Found 2 matches, need unique match")
        );
        assert_eq!(fs::read_to_string(&target)?, "print('x')\nprint('x')\n");
    }
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_task_isolation_on_timeout() -> Result<()> {
    let tasks: Vec<Task> = ["echo a", "sleep 10", "echo c", "exit 1"]
        .iter()
        .enumerate()
        .map(|(i, command)| Task {
            id: format!("t{}", i),
            command: command.to_string(),
            dir: None,
        })
        .collect();
    let options = RunOptions {
        workers: NonZeroUsize::new(2).unwrap(),
        timeout: Duration::from_millis(500),
        default_dir: PathBuf::from("."),
    };

    let summary = run_tasks_blocking(tasks, &options)?;
    assert_eq!(summary.total_tasks, 4);
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.fail_count, 2);

    let slow = &summary.results[1];
    assert_eq!(slow.id, "t1");
    assert_eq!(slow.exit_code, -1);
    assert_eq!(slow.error.as_deref(), Some(TIMEOUT_MESSAGE));
    assert_eq!(summary.results[2].stdout, "c\n");
    assert_eq!(summary.results[3].exit_code, 1);
    Ok(())
}
