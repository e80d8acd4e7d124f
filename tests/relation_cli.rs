mod support;

use predicates::str::contains;
use serde_json::Value;

use support::TestWorkspace;

fn json_stdout(output: &std::process::Output) -> Result<Value, serde_json::Error> {
    serde_json::from_slice(&output.stdout)
}

/// Tasks 1..=4 owned by alice, task 9 owned by bob.
fn seeded() -> Result<TestWorkspace, Box<dyn std::error::Error>> {
    let ws = TestWorkspace::new()?;
    ws.cmd().args(["init", "--as", "alice"]).assert().success();
    for id in ["1", "2", "3", "4"] {
        ws.cmd().args(["task", "add", id]).assert().success();
    }
    ws.cmd()
        .args(["task", "add", "9", "--owner", "bob", "--title", "Bob's task"])
        .assert()
        .success();
    Ok(ws)
}

#[test]
fn init_persists_actor() -> Result<(), Box<dyn std::error::Error>> {
    let ws = TestWorkspace::new()?;
    ws.cmd()
        .args(["init", "--as", "alice"])
        .assert()
        .success()
        .stdout(contains("initialized"));

    let actor = std::fs::read_to_string(ws.data_dir().join("actor"))?;
    assert_eq!(actor.trim(), "alice");
    assert!(ws.data_dir().join("relations.jsonl").exists());
    Ok(())
}

#[test]
fn add_writes_forward_and_mirror_rows() -> Result<(), Box<dyn std::error::Error>> {
    let ws = seeded()?;

    let output = ws
        .cmd()
        .args(["relation", "add", "1", "subtask", "2", "--json"])
        .output()?;
    assert!(output.status.success());
    let value = json_stdout(&output)?;
    assert_eq!(value["status"], "success");
    assert_eq!(value["data"]["relation"]["relation_kind"], 1);
    assert_eq!(value["data"]["relation"]["created_by_id"], "alice");
    assert_eq!(value["data"]["inverse"]["relation_kind"], 2);

    let lines = ws.relation_lines()?;
    assert_eq!(lines.len(), 2);
    let rows: Vec<Value> = lines
        .iter()
        .map(|line| serde_json::from_str(line))
        .collect::<Result<_, _>>()?;
    assert!(rows
        .iter()
        .any(|row| row["task_id"] == 2 && row["other_task_id"] == 1 && row["relation_kind"] == 2));
    Ok(())
}

#[test]
fn cycle_is_reported_with_its_own_code() -> Result<(), Box<dyn std::error::Error>> {
    let ws = seeded()?;
    for (a, b) in [("1", "2"), ("2", "3"), ("3", "4")] {
        ws.cmd()
            .args(["relation", "add", a, "subtask", b])
            .assert()
            .success();
    }

    let output = ws
        .cmd()
        .args(["relation", "add", "4", "subtask", "1", "--json"])
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    let value = json_stdout(&output)?;
    assert_eq!(value["status"], "error");
    assert_eq!(value["command"], "relation add");
    assert_eq!(value["error"]["kind"], "task_relation_cycle");
    assert_eq!(value["error"]["details"]["relation_kind"], "subtask");

    let output = ws
        .cmd()
        .args(["relation", "add", "1", "subtask", "2", "--json"])
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(json_stdout(&output)?["error"]["kind"], "relation_already_exists");

    assert_eq!(ws.relation_lines()?.len(), 6);
    Ok(())
}

#[test]
fn read_access_on_other_task_is_required() -> Result<(), Box<dyn std::error::Error>> {
    let ws = seeded()?;

    ws.cmd()
        .args(["relation", "add", "1", "blocking", "9"])
        .assert()
        .code(3)
        .stderr(contains("Forbidden"));
    assert!(ws.relation_lines()?.is_empty());

    ws.cmd()
        .args(["task", "grant", "9", "alice", "--level", "read"])
        .assert()
        .success();
    ws.cmd()
        .args(["relation", "add", "1", "blocking", "9"])
        .assert()
        .success();

    // Read is not enough to change relations based on task 9.
    ws.cmd()
        .args(["relation", "remove", "9", "blocked", "1"])
        .assert()
        .code(3);
    ws.cmd()
        .args(["--actor", "bob", "relation", "remove", "9", "blocked", "1"])
        .assert()
        .success();
    assert!(ws.relation_lines()?.is_empty());
    Ok(())
}

#[test]
fn missing_task_and_bad_kind_are_user_errors() -> Result<(), Box<dyn std::error::Error>> {
    let ws = seeded()?;

    let output = ws
        .cmd()
        .args(["relation", "add", "1", "related", "404", "--json"])
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    let value = json_stdout(&output)?;
    assert_eq!(value["error"]["kind"], "task_does_not_exist");
    assert_eq!(value["error"]["details"]["side"], "other");

    ws.cmd()
        .args(["relation", "add", "1", "sibling", "2"])
        .assert()
        .code(2)
        .stderr(contains("Invalid relation kind"));

    ws.cmd()
        .args(["relation", "add", "2", "copied_from", "2"])
        .assert()
        .code(2)
        .stderr(contains("cannot be related to itself"));
    Ok(())
}

#[test]
fn list_groups_relations_by_kind() -> Result<(), Box<dyn std::error::Error>> {
    let ws = seeded()?;
    ws.cmd()
        .args(["relation", "add", "1", "subtask", "3"])
        .assert()
        .success();
    ws.cmd()
        .args(["relation", "add", "1", "subtask", "2"])
        .assert()
        .success();
    ws.cmd()
        .args(["relation", "add", "4", "precedes", "1"])
        .assert()
        .success();

    let output = ws
        .cmd()
        .args(["relation", "list", "1", "--json"])
        .output()?;
    assert!(output.status.success());
    let value = json_stdout(&output)?;
    let relations = &value["data"]["relations"];
    assert_eq!(relations["subtask"][0]["task_id"], 2);
    assert_eq!(relations["subtask"][1]["task_id"], 3);
    assert_eq!(relations["follows"][0]["task_id"], 4);

    ws.cmd()
        .args(["relation", "remove", "1", "follows", "4"])
        .assert()
        .success();
    let output = ws
        .cmd()
        .args(["relation", "list", "4", "--json"])
        .output()?;
    let value = json_stdout(&output)?;
    assert_eq!(value["data"]["relations"], serde_json::json!({}));
    Ok(())
}

#[test]
fn remove_missing_relation_reports_does_not_exist() -> Result<(), Box<dyn std::error::Error>> {
    let ws = seeded()?;
    let output = ws
        .cmd()
        .args(["relation", "remove", "1", "subtask", "2", "--json"])
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(json_stdout(&output)?["error"]["kind"], "relation_does_not_exist");
    Ok(())
}
