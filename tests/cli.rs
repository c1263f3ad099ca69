//! End-to-end tests driving the `nt` binary against throwaway repositories.

use std::path::Path;
use std::process::Command as StdCommand;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) -> String {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git should run");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn init_repo(dir: &Path) {
    git(dir, &["init", "-q"]);
    git(dir, &["config", "user.name", "Test User"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    git(dir, &["commit", "-q", "--allow-empty", "-m", "root"]);
}

fn nt(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("nt").expect("binary should build");
    cmd.current_dir(dir)
        .env_remove("NT_REPO")
        .env_remove("NT_AUTHOR")
        .env_remove("NT_REMOTE")
        .env_remove("NT_ANCHOR")
        .env_remove("RUST_LOG")
        .arg("--json");
    cmd
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = nt(dir).args(args).assert().success().get_output().clone();
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn error_code(dir: &Path, args: &[&str]) -> (i32, String) {
    let output = nt(dir).args(args).assert().failure().get_output().clone();
    let stderr = String::from_utf8_lossy(&output.stderr);
    let last = stderr.lines().last().unwrap_or_default();
    let value: Value = serde_json::from_str(last).expect("stderr should end with JSON");
    (
        output.status.code().unwrap_or(-1),
        value["error"]["code"].as_str().unwrap_or_default().to_string(),
    )
}

#[test]
fn test_issue_lifecycle() {
    let repo = TempDir::new().unwrap();
    init_repo(repo.path());

    let created = run_json(repo.path(), &["issue", "create", "Crash on start", "-d", "trace"]);
    assert_eq!(created["action"], "Created");
    assert_eq!(created["author"], "Test User <test@example.com>");
    let code = created["short_id"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);

    let listed = run_json(repo.path(), &["issue", "list"]);
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["records"][0]["short_id"], code.as_str());

    let closed = run_json(repo.path(), &["issue", "close", &code.to_lowercase()]);
    assert_eq!(closed["closed"], "true");
    assert_eq!(run_json(repo.path(), &["issue", "list"])["count"], 0);
    assert_eq!(run_json(repo.path(), &["issue", "list", "--all"])["count"], 1);

    run_json(repo.path(), &["issue", "delete", &code]);
    let all = run_json(repo.path(), &["issue", "list", "--all", "--deleted"]);
    assert_eq!(all["count"], 1);
    assert!(all["records"][0]["deleted_at"].is_string());

    let anchor = run_json(repo.path(), &["anchor"]);
    let root = git(repo.path(), &["rev-list", "--max-parents=0", "HEAD"]);
    assert_eq!(anchor["anchor"], root.as_str());
    let note = git(repo.path(), &["notes", "--ref", "refs/notes/nt/issues", "show", &root]);
    assert!(note.contains("Crash on start"));
}

#[test]
fn test_projects_issues_and_comments() {
    let repo = TempDir::new().unwrap();
    init_repo(repo.path());

    let project = run_json(repo.path(), &["project", "create", "Compiler"]);
    let project_code = project["short_id"].as_str().unwrap().to_string();
    let issue = run_json(
        repo.path(),
        &["issue", "create", "Parser bug", "--project", &project_code],
    );
    assert_eq!(issue["parent_id"], project["id"]);
    run_json(repo.path(), &["issue", "create", "Unfiled"]);

    let filtered = run_json(repo.path(), &["issue", "list", "--project", &project_code]);
    assert_eq!(filtered["count"], 1);

    let issue_code = issue["short_id"].as_str().unwrap().to_string();
    run_json(repo.path(), &["comment", "add", &issue_code, "seen it too"]);
    let shown = run_json(repo.path(), &["issue", "show", &issue_code]);
    assert_eq!(shown["comments"][0]["content"], "seen it too");

    let details = run_json(repo.path(), &["project", "show", &project_code]);
    assert_eq!(details["issues"].as_array().unwrap().len(), 1);
}

#[test]
fn test_commit_msg_hook_closes_issue() {
    let repo = TempDir::new().unwrap();
    init_repo(repo.path());

    let issue = run_json(repo.path(), &["issue", "create", "Flaky test"]);
    let code = issue["short_id"].as_str().unwrap();
    let message = repo.path().join("COMMIT_EDITMSG");
    std::fs::write(&message, format!("Stabilise test\n\nFixes #{code}, closes ZZZZZZ\n")).unwrap();

    let result = run_json(
        repo.path(),
        &["hook", "commit-msg", message.to_str().unwrap()],
    );
    assert_eq!(result["closed"][0], code);
    assert_eq!(result["unknown"][0], "ZZZZZZ");
    assert_eq!(run_json(repo.path(), &["issue", "list"])["count"], 0);
}

#[test]
fn test_sync_between_clones() {
    let upstream = TempDir::new().unwrap();
    init_repo(upstream.path());
    let clone = TempDir::new().unwrap();
    git(
        clone.path(),
        &["clone", "-q", upstream.path().to_str().unwrap(), "."],
    );
    git(clone.path(), &["config", "user.name", "Clone User"]);
    git(clone.path(), &["config", "user.email", "clone@example.com"]);

    run_json(clone.path(), &["issue", "create", "From clone"]);
    run_json(clone.path(), &["sync", "push"]);
    run_json(upstream.path(), &["issue", "create", "From upstream"]);
    run_json(clone.path(), &["issue", "create", "Not pushed yet"]);

    // the pull replaces the local ref, the merge puts the unpushed issue back
    let pulled = run_json(clone.path(), &["sync", "pull"]);
    assert_eq!(pulled["results"][0]["stats"]["added"], 1);
    assert_eq!(run_json(clone.path(), &["issue", "list"])["count"], 3);

    let merged = run_json(clone.path(), &["sync", "merge", "--all"]);
    assert_eq!(merged["results"].as_array().unwrap().len(), 3);
    // projects and comments were never created
    assert!(merged["results"][0]["stats"].is_null());

    let status = run_json(clone.path(), &["sync", "status"]);
    assert_eq!(status["categories"][1]["records"], 3);
}

#[test]
fn test_errors_map_to_exit_codes() {
    let empty = TempDir::new().unwrap();
    git(empty.path(), &["init", "-q"]);
    assert_eq!(
        error_code(empty.path(), &["--author", "Ada", "issue", "list"]),
        (2, "NO_COMMITS".to_string())
    );

    let repo = TempDir::new().unwrap();
    init_repo(repo.path());
    assert_eq!(
        error_code(repo.path(), &["issue", "show", "nope"]),
        (3, "RECORD_NOT_FOUND".to_string())
    );
    assert_eq!(
        error_code(repo.path(), &["issue", "update", "nope"]),
        (4, "INVALID_ARGUMENT".to_string())
    );
}

#[test]
fn test_version_outside_repository() {
    let dir = TempDir::new().unwrap();
    let value = run_json(dir.path(), &["version"]);
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(value["namespace"], "refs/notes/nt/");
}
