// Drives the compiled binary against a throwaway database.

use assert_cmd::Command;
use serde_json::Value;
use std::path::Path;
use tempfile::tempdir;

fn typesight(db: &Path, config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("typesight").unwrap();
    cmd.arg("--db").arg(db).arg("--config").arg(config);
    cmd
}

fn json_stdout(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn record_history_and_analyze() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("sessions.db");
    let config = dir.path().join("config.json");

    let output = typesight(&db, &config)
        .args([
            "--user",
            "alice",
            "record",
            "--raw-text",
            "the cat sat",
            "--typed-text",
            "the car sat",
            "--duration",
            "15",
            "--timings",
            "50,200,52,48",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let created = json_stdout(&output);
    assert_eq!(created["success"], true);
    assert_eq!(created["data"]["userId"], "alice");
    let id = created["data"]["id"].as_i64().unwrap();

    let output = typesight(&db, &config)
        .args(["--user", "alice", "history"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let history = json_stdout(&output);
    assert_eq!(history["count"], 1);

    let id = id.to_string();
    let output = typesight(&db, &config)
        .args(["--user", "alice", "analyze", id.as_str()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let analysis = &json_stdout(&output)["data"]["analysis"];
    assert_eq!(analysis["errorPatterns"]["commonErrorWords"][0]["word"], "cat");
    assert_eq!(analysis["errorPatterns"]["speedTrend"], "consistent");
}

#[test]
fn analyze_reports_not_found_and_forbidden() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("sessions.db");
    let config = dir.path().join("config.json");

    let output = typesight(&db, &config)
        .args(["--user", "alice", "analyze", "7"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let body = json_stdout(&output);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Session not found");

    typesight(&db, &config)
        .args(["--user", "alice", "record", "--raw-text", "a", "--typed-text", "a"])
        .assert()
        .success();

    let output = typesight(&db, &config)
        .args(["--user", "bob", "history", "--of", "alice"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(
        json_stdout(&output)["error"],
        "Not authorized to access these sessions"
    );

    typesight(&db, &config)
        .args(["--user", "bob", "--role", "admin", "history", "--of", "alice"])
        .assert()
        .success();
}

#[test]
fn import_reads_session_json_from_stdin() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("sessions.db");
    let config = dir.path().join("config.json");

    let payload = r#"{"duration": 30, "wpm": 72, "accuracy": 97, "totalErrors": 1,
        "typingDurations": [120, 240], "textType": "numbers",
        "rawText": "1 2 3", "typedText": "1 2 4"}"#;

    let output = typesight(&db, &config)
        .args(["--user", "carol", "import"])
        .write_stdin(payload)
        .output()
        .unwrap();
    assert!(output.status.success());
    let body = json_stdout(&output);
    assert_eq!(body["data"]["textType"], "numbers");
    assert_eq!(body["data"]["wpm"], 72.0);

    let output = typesight(&db, &config)
        .args(["--user", "carol", "import"])
        .write_stdin(r#"{"duration": 60}"#)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(json_stdout(&output)["success"], false);
}

#[test]
fn rejects_unsupported_duration() {
    let dir = tempdir().unwrap();
    typesight(&dir.path().join("s.db"), &dir.path().join("c.json"))
        .args(["record", "--raw-text", "a", "--typed-text", "a", "-d", "60"])
        .assert()
        .failure();
}

#[test]
fn config_problems_are_logged_to_stderr() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("sessions.db");

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    let output = typesight(&db, &broken).arg("history").output().unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("malformed config"), "stderr: {stderr}");

    let loud = dir.path().join("loud.json");
    std::fs::write(&loud, r#"{"log_level": "loud"}"#).unwrap();
    let output = typesight(&db, &loud).arg("history").output().unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown log level"), "stderr: {stderr}");
}
