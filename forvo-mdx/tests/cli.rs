//! CLI tests for `forvo-mdx build`.
//!
//! Spawns the binary with a controlled `PATH` and verifies exit codes, dry-run
//! immutability and interactive locale prompting.
#![cfg(unix)]

use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use forvo_mdx::exit_codes;
use forvo_mdx::test_support::Workspace;

/// Directory with no-op `python3` and `curl` executables.
fn fake_bin(root: &Path) -> PathBuf {
    let bin = root.join("bin");
    fs::create_dir_all(&bin).expect("mkdir bin");
    for tool in ["python3", "curl"] {
        let path = bin.join(tool);
        fs::write(&path, "#!/bin/sh\nexit 0\n").expect("write tool");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
    }
    bin
}

fn forvo(path_env: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_forvo-mdx"))
        .args(args)
        .env("PATH", path_env)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn forvo-mdx");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait forvo-mdx")
}

/// Every path under `root`, sorted.
fn snapshot(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).expect("read dir") {
            let path = entry.expect("entry").path();
            if path.is_dir() {
                pending.push(path.clone());
            }
            found.push(path);
        }
    }
    found.sort();
    found
}

#[test]
fn missing_interpreter_exits_with_failure() {
    let ws = Workspace::spanish().expect("workspace");
    let empty = tempfile::tempdir().expect("tempdir");
    let workdir = ws.root().to_str().expect("utf-8 path");

    let output = forvo(empty.path(), &["build", "--lang", "es", "--workdir", workdir], "");

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing required interpreter `python3`"), "{stderr}");
}

#[test]
fn missing_metadata_exits_with_failure() {
    let ws = Workspace::new().expect("workspace");
    let tools = tempfile::tempdir().expect("tempdir");
    let bin = fake_bin(tools.path());
    let workdir = ws.root().to_str().expect("utf-8 path");

    let output = forvo(&bin, &["build", "--lang", "es", "--workdir", workdir], "");

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("metadata.jsonl not found"), "{stderr}");
    assert!(snapshot(ws.root()).is_empty());
}

#[test]
fn dry_run_touches_nothing() {
    let ws = Workspace::spanish().expect("workspace");
    let tools = tempfile::tempdir().expect("tempdir");
    let bin = fake_bin(tools.path());
    let workdir = ws.root().to_str().expect("utf-8 path");
    let before = snapshot(ws.root());

    let output = forvo(
        &bin,
        &["build", "--dry-run", "--lang", "es", "--workdir", workdir],
        "",
    );

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ok: metadata:"), "{stdout}");
    assert!(stdout.contains("dry-run: origins:"), "{stdout}");
    assert!(stdout.contains("dry-run: compile: compile es.mdx and es.mdd"), "{stdout}");
    assert_eq!(snapshot(ws.root()), before);
}

#[test]
fn invalid_locale_is_prompted_again() {
    let ws = Workspace::spanish().expect("workspace");
    let tools = tempfile::tempdir().expect("tempdir");
    let bin = fake_bin(tools.path());
    let workdir = ws.root().to_str().expect("utf-8 path");

    let output = forvo(
        &bin,
        &["build", "--dry-run", "--workdir", workdir],
        "x\nengl\nes\n",
    );

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid language code 'x'"), "{stderr}");
    assert!(stderr.contains("invalid language code 'engl'"), "{stderr}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("Language code").count(), 3, "{stdout}");
    assert!(stdout.contains("metadata_es_origin_stats.json"), "{stdout}");
}

#[test]
fn closed_stdin_while_prompting_fails() {
    let ws = Workspace::spanish().expect("workspace");
    let tools = tempfile::tempdir().expect("tempdir");
    let bin = fake_bin(tools.path());
    let workdir = ws.root().to_str().expect("utf-8 path");

    let output = forvo(&bin, &["build", "--dry-run", "--workdir", workdir], "");

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("stdin closed"), "{stderr}");
}
