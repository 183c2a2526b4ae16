use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn create_test_files(dir: &TempDir, files: &[(&str, &str)]) -> Result<()> {
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
    }
    Ok(())
}

fn json_stdout(cmd: &mut Command) -> Result<Value> {
    let output = cmd.assert().success().get_output().stdout.clone();
    Ok(serde_json::from_slice(&output)?)
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_index_reports_files_and_hashes() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(
        &dir,
        &[("a.py", "hello"), ("src/b.go", "package b\n"), (".git/HEAD", "ref")],
    )?;

    let value = json_stdout(
        Command::cargo_bin("scout-index")?.args(["--dir", path_arg(dir.path()), "--hash"]),
    )?;

    assert_eq!(value["total_files"], 2);
    assert_eq!(value["total_size"], 15);
    let files = value["files"].as_array().unwrap();
    let a = files.iter().find(|f| f["name"] == "a.py").unwrap();
    assert_eq!(a["extension"], ".py");
    assert_eq!(a["hash"], "5d41402abc4b2a76b9719d911017c592");
    Ok(())
}

#[test]
fn test_index_depth_limit() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("top.txt", "x"), ("nested/deep.txt", "y")])?;

    let value = json_stdout(
        Command::cargo_bin("scout-index")?.args(["--dir", path_arg(dir.path()), "--depth", "1"]),
    )?;
    assert_eq!(value["total_files"], 1);
    Ok(())
}

#[test]
fn test_search_plain_output() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("notes.txt", "first\n   TODO: fix this  \nlast\n")])?;

    Command::cargo_bin("scout-search")?
        .args(["--pattern", "todo", "-i", "--dir", path_arg(dir.path())])
        .assert()
        .success()
        .stdout(predicate::str::contains("notes.txt:2: TODO: fix this"));
    Ok(())
}

#[test]
fn test_search_json_cap() -> Result<()> {
    let dir = tempdir()?;
    let content = "match\n".repeat(10);
    create_test_files(&dir, &[("a.txt", &content), ("b.txt", &content)])?;

    let value = json_stdout(Command::cargo_bin("scout-search")?.args([
        "--pattern",
        "match",
        "--dir",
        path_arg(dir.path()),
        "--max",
        "5",
        "--json",
    ]))?;
    assert_eq!(value["count"], 5);
    assert_eq!(value["matches"].as_array().unwrap().len(), 5);
    Ok(())
}

#[test]
fn test_search_invalid_regex_is_reported_on_stderr() -> Result<()> {
    let dir = tempdir()?;
    Command::cargo_bin("scout-search")?
        .args(["--pattern", "(unclosed", "--regex", "--dir", path_arg(dir.path())])
        .assert()
        .success()
        .stderr(predicate::str::contains("Invalid regex"));
    Ok(())
}

#[test]
fn test_search_requires_pattern() -> Result<()> {
    Command::cargo_bin("scout-search")?
        .assert()
        .failure()
        .stderr(predicate::str::contains("--pattern"));
    Ok(())
}

#[test]
fn test_analyze_python_file() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(
        &dir,
        &[(
            "shapes.py",
            "import math\n\nclass Circle:\n    def area(self):\n        return math.pi\n\ndef helper():\n    pass\n",
        )],
    )?;

    let value = json_stdout(Command::cargo_bin("scout-analyze")?.args([
        "--path",
        path_arg(&dir.path().join("shapes.py")),
    ]))?;

    assert_eq!(value["total_files"], 1);
    let file = &value["files"][0];
    assert_eq!(file["language"], "python");
    assert_eq!(file["line_count"], 8);
    assert_eq!(file["imports"][0], "import math");
    let method = file["symbols"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["name"] == "area")
        .unwrap();
    assert_eq!(method["type"], "method");
    assert_eq!(method["parent"], "Circle");
    Ok(())
}

#[test]
fn test_analyze_type_filter() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("m.py", "import os\nclass A:\n    pass\ndef f():\n    pass\n")])?;

    let value = json_stdout(Command::cargo_bin("scout-analyze")?.args([
        "--path",
        path_arg(dir.path()),
        "--type",
        "class",
    ]))?;
    let symbols = value["files"][0]["symbols"].as_array().unwrap();
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0]["name"], "A");
    assert_eq!(value["files"][0]["imports"][0], "import os");
    Ok(())
}

#[test]
fn test_resolve_definition_and_references() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(
        &dir,
        &[("a.py", "def foo():\n    return 1\n"), ("b.py", "from a import foo\nfoo()\n")],
    )?;

    let value = json_stdout(
        Command::cargo_bin("scout-resolve")?.args(["--symbol", "foo", "--dir", path_arg(dir.path())]),
    )?;

    assert_eq!(value["files_searched"], 2);
    assert_eq!(value["total_refs"], 2);
    let symbol = &value["symbols"][0];
    assert_eq!(symbol["type"], "function");
    assert_eq!(symbol["definition"]["line"], 1);
    assert_eq!(symbol["definition"]["column"], 5);
    Ok(())
}

#[test]
fn test_diff_mode_produces_patch() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("old.txt", "a\nb\nc\n"), ("new.txt", "a\nB\nc\n")])?;

    let value = json_stdout(Command::cargo_bin("scout-diff")?.args([
        "--old",
        path_arg(&dir.path().join("old.txt")),
        "--new",
        path_arg(&dir.path().join("new.txt")),
        "--context",
        "1",
    ]))?;

    assert_eq!(value["success"], true);
    let hunk = &value["diff"]["hunks"][0];
    assert_eq!(hunk["old_start"], 1);
    assert_eq!(hunk["old_count"], 3);
    assert_eq!(hunk["lines"], serde_json::json!([" a", "-b", "+B", " c"]));
    assert!(value["patch"].as_str().unwrap().contains("@@ -1,3 +1,3 @@"));
    Ok(())
}

#[test]
fn test_diff_preview_and_apply() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("code.py", "x = 1\ny = 2\n")])?;
    let target = dir.path().join("code.py");

    let value = json_stdout(Command::cargo_bin("scout-diff")?.args([
        "--mode",
        "preview",
        "--target",
        path_arg(&target),
        "--old-text",
        "y = 2",
        "--new-text",
        "y = 3",
    ]))?;
    assert_eq!(value["success"], true);
    assert_eq!(value["content"], "x = 1\ny = 3\n");
    assert_eq!(fs::read_to_string(&target)?, "x = 1\ny = 2\n");

    let value = json_stdout(Command::cargo_bin("scout-diff")?.args([
        "--mode",
        "apply",
        "--target",
        path_arg(&target),
        "--old-text",
        "y = 2",
        "--new-text",
        "y = 3",
    ]))?;
    assert_eq!(value["success"], true);
    assert!(value.get("content").is_none());
    assert_eq!(fs::read_to_string(&target)?, "x = 1\ny = 3\n");
    Ok(())
}

#[test]
fn test_diff_apply_ambiguous_leaves_file() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("dup.txt", "same\nsame\n")])?;
    let target = dir.path().join("dup.txt");

    let value = json_stdout(Command::cargo_bin("scout-diff")?.args([
        "--mode",
        "apply",
        "--target",
        path_arg(&target),
        "--old-text",
        "same",
        "--new-text",
        "other",
    ]))?;
    assert_eq!(value["success"], false);
    assert_eq!(value["error"], "Found 2 matches, need unique match");
    assert_eq!(fs::read_to_string(&target)?, "same\nsame\n");
    Ok(())
}

#[test]
fn test_diff_missing_inputs_is_a_json_error() -> Result<()> {
    let value = json_stdout(Command::cargo_bin("scout-diff")?.args(["--mode", "diff"]))?;
    assert_eq!(value["success"], false);
    assert_eq!(value["error"], "--old and --new required");
    Ok(())
}

#[test]
fn test_watch_snapshot_then_since() -> Result<()> {
    let work = tempdir()?;
    let tree = work.path().join("tree");
    fs::create_dir(&tree)?;
    fs::write(tree.join("kept.rs"), "fn main() {}")?;
    fs::write(tree.join("removed.rs"), "")?;

    let snapshot = Command::cargo_bin("scout-watch")?
        .args(["--dir", path_arg(&tree), "--snapshot"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: Value = serde_json::from_slice(&snapshot)?;
    assert_eq!(parsed["count"], 2);
    let snapshot_file = work.path().join("snapshot.json");
    fs::write(&snapshot_file, &snapshot)?;

    fs::remove_file(tree.join("removed.rs"))?;
    fs::write(tree.join("added.rs"), "x")?;

    let value = json_stdout(Command::cargo_bin("scout-watch")?.args([
        "--dir",
        path_arg(&tree),
        "--since",
        path_arg(&snapshot_file),
    ]))?;
    assert_eq!(value["success"], true);
    assert_eq!(value["count"], 2);
    assert_eq!(value["events"][0]["type"], "created");
    assert_eq!(value["events"][1]["type"], "deleted");
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_run_inline_tasks() -> Result<()> {
    let value = json_stdout(Command::cargo_bin("scout-run")?.args([
        "--json",
        r#"[{"id": "ok", "command": "echo hi"}, {"command": "exit 2"}]"#,
    ]))?;

    assert_eq!(value["total_tasks"], 2);
    assert_eq!(value["success_count"], 1);
    assert_eq!(value["fail_count"], 1);
    assert_eq!(value["results"][0]["stdout"], "hi\n");
    assert_eq!(value["results"][1]["id"], "task_2");
    assert_eq!(value["results"][1]["exit_code"], 2);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_run_template_and_stdin() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("one.txt", "1\n"), ("two.txt", "2\n")])?;

    let value = json_stdout(Command::cargo_bin("scout-run")?.args([
        "--cmd",
        "cat {file}",
        "--files",
        "one.txt,two.txt",
        "--dir",
        path_arg(dir.path()),
    ]))?;
    assert_eq!(value["success_count"], 2);
    assert_eq!(value["results"][1]["stdout"], "2\n");

    let value = json_stdout(
        Command::cargo_bin("scout-run")?
            .args(["--dir", path_arg(dir.path())])
            .write_stdin("# listing\nls one.txt\n\n"),
    )?;
    assert_eq!(value["total_tasks"], 1);
    assert_eq!(value["results"][0]["stdout"], "one.txt\n");
    Ok(())
}

#[test]
fn test_run_without_tasks_fails() -> Result<()> {
    Command::cargo_bin("scout-run")?
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: No tasks to run"));
    Ok(())
}

#[test]
fn test_git_unknown_mode() -> Result<()> {
    let value = json_stdout(Command::cargo_bin("scout-git")?.args(["--mode", "push"]))?;
    assert_eq!(value["success"], false);
    assert_eq!(value["mode"], "push");
    assert_eq!(
        value["error"],
        "Mode required: blame, log, diff, status, branches"
    );
    Ok(())
}
