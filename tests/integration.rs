use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn cinedump_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("cinedump");
    path
}

fn setup_test_env(batch_size: usize) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_content = format!(
        r#"[db]
path = "{}/data/movies.sqlite"

[load]
batch_size = {}
"#,
        root.display(),
        batch_size
    );

    let config_path = root.join("cinedump.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn write_dump(tmp: &TempDir, content: &str) -> PathBuf {
    let path = tmp.path().join("dump.json");
    fs::write(&path, content).unwrap();
    path
}

fn run_cinedump(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = cinedump_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run cinedump binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

const THREE_MOVIES: &str = concat!(
    r#"{"id":1,"title":"Heat","genres":[{"id":28,"name":"Action"}]}"#,
    r#"{"id":2,"title":"Ronin"}"#,
    r#"{"id":3,"title":"A \"Great\" Movie","genres":[]}"#,
);

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env(2);

    let (stdout, stderr, success) = run_cinedump(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env(2);

    let (_, _, success1) = run_cinedump(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_cinedump(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_load_into_sqlite() {
    let (tmp, config_path) = setup_test_env(2);
    let dump = write_dump(&tmp, THREE_MOVIES);

    run_cinedump(&config_path, &["init"]);
    let (stdout, stderr, success) = run_cinedump(
        &config_path,
        &["load", dump.to_str().unwrap(), "--progress", "off"],
    );
    assert!(success, "load failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("movies decoded: 3"));
    assert!(stdout.contains("objects skipped: 0"));
    assert!(stdout.contains("batches committed: 2"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_load_idempotent_reload() {
    let (tmp, config_path) = setup_test_env(2);
    let dump = write_dump(&tmp, THREE_MOVIES);

    run_cinedump(&config_path, &["init"]);
    let (stdout1, _, success1) =
        run_cinedump(&config_path, &["load", dump.to_str().unwrap(), "--progress", "off"]);
    assert!(success1, "first load failed: {}", stdout1);

    // Reload of the same dump upserts; same counts, no failure.
    let (stdout2, _, success2) =
        run_cinedump(&config_path, &["load", dump.to_str().unwrap(), "--progress", "off"]);
    assert!(success2, "reload failed: {}", stdout2);
    assert!(stdout2.contains("movies decoded: 3"));
}

#[test]
fn test_check_reports_counts_without_writing() {
    let (tmp, config_path) = setup_test_env(2);
    let dump = write_dump(&tmp, THREE_MOVIES);

    // No init: check must not need a database.
    let (stdout, stderr, success) = run_cinedump(
        &config_path,
        &["check", dump.to_str().unwrap(), "--progress", "off"],
    );
    assert!(success, "check failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("movies decoded: 3"));
    assert!(stdout.contains("batches committed: 2"));
    assert!(!tmp.path().join("data").join("movies.sqlite").exists());
}

#[test]
fn test_load_into_json_array() {
    let (tmp, config_path) = setup_test_env(10);
    let dump = write_dump(&tmp, THREE_MOVIES);
    let out = tmp.path().join("out").join("movies.json");

    let (stdout, stderr, success) = run_cinedump(
        &config_path,
        &[
            "load",
            dump.to_str().unwrap(),
            "--into",
            "json",
            "--output",
            out.to_str().unwrap(),
            "--progress",
            "off",
        ],
    );
    assert!(success, "load failed: stdout={}, stderr={}", stdout, stderr);

    let content = fs::read_to_string(&out).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
    let movies = parsed.as_array().expect("output is a JSON array");
    assert_eq!(movies.len(), 3);

    // Defaults applied: absent scalars are zero/empty, empty genre list
    // became the sentinel reference.
    assert_eq!(movies[1]["vote_count"], 0);
    assert_eq!(movies[1]["overview"], "");
    assert_eq!(movies[1]["release_date"], "0001-01-01");
    assert_eq!(movies[2]["title"], "A \"Great\" Movie");
    assert_eq!(movies[2]["genres"][0]["id"], 0);
    assert_eq!(movies[2]["genres"][0]["kind"], "genre");
}

#[test]
fn test_load_into_sql_statements() {
    let (tmp, config_path) = setup_test_env(2);
    let dump = write_dump(&tmp, THREE_MOVIES);
    let out = tmp.path().join("movies.sql");

    let (stdout, _, success) = run_cinedump(
        &config_path,
        &[
            "load",
            dump.to_str().unwrap(),
            "--into",
            "sql",
            "--output",
            out.to_str().unwrap(),
            "--progress",
            "off",
        ],
    );
    assert!(success, "load failed: {}", stdout);

    let sql = fs::read_to_string(&out).unwrap();
    // One BEGIN/COMMIT pair per batch: 3 movies at batch size 2 is 2 batches.
    assert_eq!(sql.matches("BEGIN;").count(), 2);
    assert_eq!(sql.matches("COMMIT;").count(), 2);
    assert_eq!(sql.matches("INSERT OR REPLACE INTO movies").count(), 3);
}

#[test]
fn test_malformed_object_is_skipped() {
    let (tmp, config_path) = setup_test_env(10);
    let dump = write_dump(&tmp, r#"{"id":1}{"id": not json}{"id":3}"#);

    let (stdout, _, success) = run_cinedump(
        &config_path,
        &["check", dump.to_str().unwrap(), "--progress", "off"],
    );
    assert!(success, "check should survive a malformed object");
    assert!(stdout.contains("movies decoded: 2"));
    assert!(stdout.contains("objects skipped: 1"));
}

#[test]
fn test_truncated_dump_fails_with_counts() {
    let (tmp, config_path) = setup_test_env(1);
    let dump = write_dump(&tmp, r#"{"id":1}{"id":2}{"id":3,"title":"cut"#);

    let (stdout, stderr, success) = run_cinedump(
        &config_path,
        &["check", dump.to_str().unwrap(), "--progress", "off"],
    );
    assert!(!success, "truncated dump must fail");
    assert!(stderr.contains("unclosed brace"), "stderr: {}", stderr);
    // Objects recovered before the truncation point are still reported.
    assert!(stdout.contains("movies decoded: 2"));
    assert!(stdout.contains("batches committed: 2"));
}

#[test]
fn test_limit_stops_early() {
    let (tmp, config_path) = setup_test_env(10);
    let dump = write_dump(&tmp, THREE_MOVIES);

    let (stdout, _, success) = run_cinedump(
        &config_path,
        &[
            "check",
            dump.to_str().unwrap(),
            "--limit",
            "2",
            "--progress",
            "off",
        ],
    );
    assert!(success, "check with --limit failed: {}", stdout);
    assert!(stdout.contains("movies decoded: 2"));
    assert!(stdout.contains("batches committed: 1"));
}

#[test]
fn test_unknown_destination_rejected() {
    let (tmp, config_path) = setup_test_env(2);
    let dump = write_dump(&tmp, THREE_MOVIES);

    let (_, stderr, success) = run_cinedump(
        &config_path,
        &["load", dump.to_str().unwrap(), "--into", "parquet"],
    );
    assert!(!success);
    assert!(stderr.contains("Unknown destination"));
}
