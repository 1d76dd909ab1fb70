//! Integration tests for the command-line interface
//!
//! Drives the compiled binary against files in a temp directory

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const TERMINAL: &str = r#"impl Terminal {
    pub fn append_output(&mut self, text: &str) {
        for c in text.chars() {
            self.push(c);
        }
    }

    pub fn clear(&mut self) {}
}
"#;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_block-patcher"))
}

fn setup(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("terminal.rs");
    fs::write(&file, content).unwrap();
    (dir, file)
}

fn run(args: &[&str]) -> Output {
    bin().args(args).output().unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    let output = run(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("locate"));
    assert!(stdout.contains("replace"));
    assert!(stdout.contains("delete"));
    assert!(stdout.contains("plan"));
}

#[test]
fn test_locate_prints_line_range() {
    let (_dir, file) = setup(TERMINAL);

    let output = run(&["locate", file.to_str().unwrap(), "fn append_output"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(":2-6"), "unexpected output: {stdout}");
}

#[test]
fn test_locate_json() {
    let (_dir, file) = setup(TERMINAL);

    let output = run(&[
        "locate",
        file.to_str().unwrap(),
        "fn clear",
        "--json",
    ]);

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["span"]["start"], 7);
    assert_eq!(value["span"]["end"], 8);
    assert_eq!(value["first_line"], 8);
    assert!(value["xxh3"].as_str().unwrap().starts_with("0x"));
}

#[test]
fn test_locate_all_json() {
    let (_dir, file) = setup("fn t() {\n}\nfn t() {\n    x\n}\n");

    let output = run(&["locate", file.to_str().unwrap(), "fn t()", "--all", "--json"]);

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);
    assert_eq!(value[1]["span"]["start"], 2);
}

#[test]
fn test_locate_all_honors_from() {
    let (_dir, file) = setup("fn t() {\n}\nfn t() {\n    x\n}\n");

    let output = run(&[
        "locate",
        file.to_str().unwrap(),
        "fn t()",
        "--all",
        "--from",
        "2",
        "--json",
    ]);

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 1);
    assert_eq!(value[0]["first_line"], 3);
}

#[test]
fn test_replace_with_inline_text() {
    let (_dir, file) = setup(TERMINAL);

    let output = run(&[
        "replace",
        file.to_str().unwrap(),
        "pub fn append_output",
        "--with",
        "    pub fn append_output(&mut self, text: &str) {\n        self.buf.push_str(text);\n    }",
    ]);

    assert!(output.status.success());
    let content = fs::read_to_string(&file).unwrap();
    assert!(content.contains("self.buf.push_str(text);\n    }\n\n    pub fn clear"));
    assert!(!content.contains("self.push(c)"));
}

#[test]
fn test_replace_from_stdin() {
    let (_dir, file) = setup(TERMINAL);

    let mut child = bin()
        .args(["replace", file.to_str().unwrap(), "pub fn clear"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"    pub fn clear(&mut self) {\n        self.buf.clear();\n    }\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let content = fs::read_to_string(&file).unwrap();
    assert!(content.ends_with("        self.buf.clear();\n    }\n}\n"));
}

#[test]
fn test_delete_dry_run_leaves_file() {
    let (_dir, file) = setup(TERMINAL);

    let output = run(&[
        "delete",
        file.to_str().unwrap(),
        "pub fn append_output",
        "--dry-run",
        "--diff",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Would remove"));
    assert!(stdout.contains("-        for c in text.chars() {"));
    assert_eq!(fs::read_to_string(&file).unwrap(), TERMINAL);
}

#[test]
fn test_delete_twice_fails_second_time() {
    let (_dir, file) = setup(TERMINAL);
    let args = ["delete", file.to_str().unwrap(), "pub fn append_output"];

    assert!(run(&args).status.success());
    let after_first = fs::read_to_string(&file).unwrap();

    let second = run(&args);
    assert!(!second.status.success());
    let stderr = String::from_utf8_lossy(&second.stderr);
    assert!(stderr.contains("not found"));
    assert_eq!(fs::read_to_string(&file).unwrap(), after_first);
}

#[test]
fn test_unbalanced_block_reports_error() {
    let (_dir, file) = setup("fn f() {\n    body\n");

    let output = run(&["delete", file.to_str().unwrap(), "fn f()"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unbalanced"));
    assert_eq!(fs::read_to_string(&file).unwrap(), "fn f() {\n    body\n");
}

#[test]
fn test_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.rs");

    let output = run(&["locate", missing.to_str().unwrap(), "fn f()"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("File not found"));
}

#[test]
fn test_plan_applies_and_summarizes() {
    let (dir, file) = setup(TERMINAL);
    let plan = dir.path().join("plan.toml");
    fs::write(
        &plan,
        r#"
[meta]
name = "terminal"

[[edits]]
id = "drop-clear"
anchor = "pub fn clear"

[edits.operation]
type = "delete"

[[edits]]
id = "gone"
anchor = "fn never_there"
optional = true

[edits.operation]
type = "delete"
"#,
    )
    .unwrap();

    let output = run(&["plan", file.to_str().unwrap(), plan.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("drop-clear"));
    assert!(stdout.contains("Summary:"));
    assert!(!fs::read_to_string(&file).unwrap().contains("fn clear"));
}

#[test]
fn test_replace_twice_reports_already_applied() {
    let (_dir, file) = setup(TERMINAL);
    let args = [
        "replace",
        file.to_str().unwrap(),
        "pub fn clear",
        "--with",
        "    pub fn clear(&mut self) {\n        self.buf.clear();\n    }",
        "--diff",
    ];

    let first = run(&args);
    assert!(first.status.success());
    let stdout = String::from_utf8_lossy(&first.stdout);
    assert!(stdout.contains("Replaced"));
    assert!(stdout.contains("+        self.buf.clear();"), "unexpected output: {stdout}");
    let after_first = fs::read_to_string(&file).unwrap();

    let second = run(&args);
    assert!(second.status.success());
    let stdout = String::from_utf8_lossy(&second.stdout);
    assert!(stdout.contains("Already applied"));
    assert!(!stdout.contains("+++"));
    assert_eq!(fs::read_to_string(&file).unwrap(), after_first);
}
