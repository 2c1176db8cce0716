//! Black-box scenario tests for the `todo` binary (spec §8, S1-S7).
//!
//! Each test drives the actual CLI binary against an isolated temp
//! project directory using `assert_cmd` against a real process.

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

fn todo_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("todo").expect("todo binary built");
    cmd.current_dir(dir.path());
    cmd.arg("--json");
    cmd
}

fn run_json(dir: &TempDir, args: &[&str]) -> (i32, Value) {
    let output = todo_cmd(dir).args(args).output().expect("spawn todo");
    let code = output.status.code().unwrap_or(-1);
    let value: Value = serde_json::from_slice(&output.stdout).unwrap_or_else(|_| {
        panic!(
            "expected JSON stdout for {args:?}, got: {}",
            String::from_utf8_lossy(&output.stdout)
        )
    });
    (code, value)
}

fn init(dir: &TempDir) {
    let (code, _) = run_json(dir, &["init"]);
    assert_eq!(code, 0, "init should succeed");
}

/// S1: add + complete drives recommendation and actionable filtering.
#[test]
fn s1_add_and_complete_workflow() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    let (code, value) = run_json(&dir, &["add", "Implement auth", "--priority", "high"]);
    assert_eq!(code, 0);
    let t001 = value["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(t001, "T001");

    let (code, value) = run_json(&dir, &["add", "Write tests", "--depends", &t001]);
    assert_eq!(code, 0);
    let t002 = value["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(t002, "T002");

    let (code, value) = run_json(&dir, &["list", "--status", "pending"]);
    assert_eq!(code, 0);
    let ids: Vec<&str> = value["data"]["tasks"].as_array().unwrap().iter().map(|t| t["id"].as_str().unwrap()).collect();
    assert!(ids.contains(&t001.as_str()));
    assert!(ids.contains(&t002.as_str()));

    let (code, value) = run_json(&dir, &["analyze", "recommend"]);
    assert_eq!(code, 0);
    assert_eq!(value["data"]["task"]["id"], t001);

    let (code, _) = run_json(&dir, &["complete", &t001, "--notes", "done"]);
    assert_eq!(code, 0);

    let (code, value) = run_json(&dir, &["list", "--status", "pending"]);
    assert_eq!(code, 0);
    let tasks = value["data"]["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["id"], t002);
}

/// S2: introducing a dependency cycle fails with exit 6 and leaves the
/// store unchanged.
#[test]
fn s2_cycle_prevention() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    let (_, v1) = run_json(&dir, &["add", "First"]);
    let t001 = v1["data"]["id"].as_str().unwrap().to_string();
    let (_, v2) = run_json(&dir, &["add", "Second", "--depends", &t001]);
    let t002 = v2["data"]["id"].as_str().unwrap().to_string();

    let (code, value) = run_json(&dir, &["update", &t002, "--add-depends", &t001]);
    assert_eq!(code, 6);
    assert!(value["error"]["code"].as_str().unwrap().contains("cycle") || value["error"]["code"] == "dependency_cycle");

    let (_, before) = run_json(&dir, &["show", &t002]);
    let (code, after_update) = run_json(&dir, &["update", &t001, "--add-depends", &t002]);
    assert_eq!(code, 6, "the reverse edge introducing the same cycle must also fail");
    let _ = after_update;
    let (_, after) = run_json(&dir, &["show", &t002]);
    assert_eq!(before, after, "store must be unchanged after a rejected mutation");
}

/// S3: hierarchy depth and sibling-count bounds.
#[test]
fn s3_depth_and_sibling_bounds() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    let (_, v) = run_json(&dir, &["add", "Epic", "--type", "epic"]);
    let epic = v["data"]["id"].as_str().unwrap().to_string();
    let (_, v) = run_json(&dir, &["add", "Child", "--parent", &epic]);
    let child = v["data"]["id"].as_str().unwrap().to_string();
    let (_, v) = run_json(&dir, &["add", "Grandchild", "--parent", &child]);
    let grandchild = v["data"]["id"].as_str().unwrap().to_string();

    let (code, _) = run_json(&dir, &["add", "X", "--parent", &grandchild]);
    assert_eq!(code, 11, "exceeding max depth must fail with exit 11");

    let (_, v) = run_json(&dir, &["add", "Siblings Epic", "--type", "epic"]);
    let siblings_epic = v["data"]["id"].as_str().unwrap().to_string();
    for i in 0..7 {
        let (code, _) = run_json(&dir, &["add", &format!("Sibling {i}"), "--parent", &siblings_epic]);
        assert_eq!(code, 0, "sibling {i} under the cap should succeed");
    }
    let (code, _) = run_json(&dir, &["add", "Eighth", "--parent", &siblings_epic]);
    assert_eq!(code, 12, "the 8th sibling must fail with exit 12");
}

/// S5: archive round-trip, by explicit id.
#[test]
fn s5_archive_round_trip() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    let (_, v) = run_json(&dir, &["add", "Ship it"]);
    let id = v["data"]["id"].as_str().unwrap().to_string();
    let (code, _) = run_json(&dir, &["complete", &id, "--skip-notes"]);
    assert_eq!(code, 0);

    let (code, _) = run_json(&dir, &["archive", &id]);
    assert_eq!(code, 0);

    let (code, v) = run_json(&dir, &["show", &id]);
    assert_eq!(code, 4, "a task archived out of the active store is no longer found there: {v:?}");

    let (code, _) = run_json(&dir, &["add", "Collides"]);
    assert_eq!(code, 0);

    let (code, v) = run_json(&dir, &["unarchive", &id]);
    assert_eq!(code, 0, "unarchive should succeed onto a clear id: {v:?}");
}

/// S5 (spec's literal criteria-based scenario): with `archive.daysUntilArchive`
/// set to 0, a bare `archive` sweep moves every completed task out of the
/// active store, recording a non-negative `cycleTimeDays`.
#[test]
fn s5_archive_sweep_by_retention_criteria() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    std::fs::write(dir.path().join(".todo").join("config.json"), r#"{"archive":{"daysUntilArchive":0}}"#).unwrap();

    let (_, v) = run_json(&dir, &["add", "Ship it"]);
    let id = v["data"]["id"].as_str().unwrap().to_string();
    let (code, _) = run_json(&dir, &["complete", &id, "--skip-notes"]);
    assert_eq!(code, 0);

    let (code, v) = run_json(&dir, &["archive"]);
    assert_eq!(code, 0, "{v:?}");
    let archived_ids: Vec<&str> = v["data"]["archivedIds"].as_array().unwrap().iter().map(|x| x.as_str().unwrap()).collect();
    assert_eq!(archived_ids, vec![id.as_str()]);

    let (code, v) = run_json(&dir, &["show", &id]);
    assert_eq!(code, 4, "{v:?}");
}

/// S4: phase advance guards (completion threshold, then critical-task
/// block), both overridable only by fixing their underlying cause.
#[test]
fn s4_phase_advance_guards() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    std::fs::write(
        dir.path().join(".todo").join("config.json"),
        r#"{"validation":{"phaseValidation":{"phaseAdvanceThreshold":90}}}"#,
    )
    .unwrap();

    let (code, v) = run_json(&dir, &["add", "core task 0", "--phase", "core", "--add-phase"]);
    assert_eq!(code, 0, "{v:?}");
    let mut core_ids = vec![v["data"]["id"].as_str().unwrap().to_string()];
    for i in 1..10 {
        let title = format!("core task {i}");
        let (code, v) = run_json(&dir, &["add", &title, "--phase", "core"]);
        assert_eq!(code, 0, "{v:?}");
        core_ids.push(v["data"]["id"].as_str().unwrap().to_string());
    }
    let (code, _) = run_json(&dir, &["add", "release task", "--phase", "release", "--add-phase"]);
    assert_eq!(code, 0);

    let (code, _) = run_json(&dir, &["phase", "start", "core"]);
    assert_eq!(code, 0);

    for id in &core_ids[0..7] {
        let (code, _) = run_json(&dir, &["complete", id, "--skip-notes"]);
        assert_eq!(code, 0);
    }

    let (code, v) = run_json(&dir, &["phase", "advance"]);
    assert_eq!(code, 6, "{v:?}");
    assert!(v["error"]["message"].as_str().unwrap().contains("completionPercent:70"), "{v:?}");
    assert!(v["error"]["message"].as_str().unwrap().contains("threshold:90"), "{v:?}");

    let (code, v) = run_json(&dir, &["add", "a critical blocker", "--phase", "core", "--priority", "critical"]);
    assert_eq!(code, 0, "{v:?}");
    let critical_id = v["data"]["id"].as_str().unwrap().to_string();

    let (code, v) = run_json(&dir, &["phase", "advance", "--force"]);
    assert_eq!(code, 6, "a critical pending task must block advance even with --force: {v:?}");
    assert!(v["error"]["message"].as_str().unwrap().contains("critical"), "{v:?}");

    let (code, _) = run_json(&dir, &["update", &critical_id, "--phase", "release"]);
    assert_eq!(code, 0);
    std::fs::write(
        dir.path().join(".todo").join("config.json"),
        r#"{"validation":{"phaseValidation":{"phaseAdvanceThreshold":50}}}"#,
    )
    .unwrap();

    let (code, v) = run_json(&dir, &["phase", "advance"]);
    assert_eq!(code, 0, "{v:?}");
    assert_eq!(v["data"]["next"], "release");

    let store: Value = serde_json::from_str(&std::fs::read_to_string(dir.path().join(".todo").join("todo.json")).unwrap()).unwrap();
    let history = store["project"]["phase_history"].as_array().unwrap();
    let last_two: Vec<&str> = history[history.len() - 2..].iter().map(|e| e["transition_type"].as_str().unwrap()).collect();
    assert_eq!(last_two, vec!["completed", "started"]);
}

/// S7: lifecycle gate enforcement in strict mode.
#[test]
fn s7_lifecycle_gate_enforcement() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    std::fs::write(dir.path().join(".todo").join("config.json"), r#"{"lifecycleEnforcement":{"mode":"strict"}}"#).unwrap();

    let (_, v) = run_json(&dir, &["add", "Epic", "--type", "epic"]);
    let epic = v["data"]["id"].as_str().unwrap().to_string();

    for stage in ["consensus", "specification", "decomposition"] {
        let (code, _) = run_json(&dir, &["lifecycle", "record-stage", &epic, stage, "--status", "completed"]);
        assert_eq!(code, 0);
    }

    let (code, v) = run_json(&dir, &["lifecycle", "spawn", &epic, "implementation"]);
    assert_eq!(code, 75, "{v:?}");
    assert_eq!(v["error"]["code"], "lifecycle_gate_failed");
    assert!(v["error"]["message"].as_str().unwrap().contains("research"), "{v:?}");

    let (code, _) = run_json(&dir, &["lifecycle", "record-stage", &epic, "research", "--status", "completed"]);
    assert_eq!(code, 0);

    let (code, v) = run_json(&dir, &["lifecycle", "spawn", &epic, "implementation"]);
    assert_eq!(code, 0, "{v:?}");
}
