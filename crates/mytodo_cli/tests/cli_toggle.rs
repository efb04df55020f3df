use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("mytodo-{nanos}-{name}"))
}

fn mytodo(store_dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_mytodo"));
    command
        .env("MYTODO_STORE_DIR", store_dir)
        .env("MYTODO_CONFIG_PATH", store_dir.join("config.json"))
        .env("MYTODO_DISABLE_NOTIFICATIONS", "1")
        .env_remove("MYTODO_LOG");
    command
}

fn write_store(store_dir: &Path, tasks: serde_json::Value) {
    std::fs::create_dir_all(store_dir).unwrap();
    std::fs::write(
        store_dir.join("pinnacle-todo-tasks.json"),
        serde_json::to_string_pretty(&tasks).unwrap(),
    )
    .unwrap();
}

fn read_store(store_dir: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(store_dir.join("pinnacle-todo-tasks.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn toggle_command_completes_and_reopens() {
    let store_dir = temp_path("cli-toggle");
    write_store(
        &store_dir,
        serde_json::json!([
            {"id": 1, "text": "demo", "completed": false, "createdAt": "2025-12-20T00:00:00Z"}
        ]),
    );

    let first = mytodo(&store_dir)
        .args(["toggle", "1"])
        .output()
        .expect("failed to run toggle command");
    let after_first = read_store(&store_dir);

    let second = mytodo(&store_dir)
        .args(["toggle", "1"])
        .output()
        .expect("failed to run toggle command");
    let after_second = read_store(&store_dir);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(first.status.success());
    assert!(String::from_utf8_lossy(&first.stdout).contains("Task completed!"));
    assert_eq!(after_first[0]["completed"], true);
    assert!(after_first[0]["completedAt"].is_string());

    assert!(second.status.success());
    assert!(String::from_utf8_lossy(&second.stdout).contains("Task marked as active"));
    assert_eq!(after_second[0]["completed"], false);
    assert!(after_second[0].get("completedAt").is_none());
}

#[test]
fn clear_completed_removes_only_completed_tasks() {
    let store_dir = temp_path("cli-clear");
    write_store(
        &store_dir,
        serde_json::json!([
            {"id": 3, "text": "c", "completed": true, "createdAt": "2025-12-20T00:00:03Z"},
            {"id": 2, "text": "b", "completed": false, "createdAt": "2025-12-20T00:00:02Z"},
            {"id": 1, "text": "a", "completed": true, "createdAt": "2025-12-20T00:00:01Z"}
        ]),
    );

    let output = mytodo(&store_dir)
        .arg("clear-completed")
        .output()
        .expect("failed to run clear-completed command");

    let stored = read_store(&store_dir);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("2 completed task(s) cleared!"));
    let remaining = stored.as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["text"], "b");
}

#[test]
fn clear_completed_with_nothing_to_clear_is_silent() {
    let store_dir = temp_path("cli-clear-none");
    write_store(
        &store_dir,
        serde_json::json!([
            {"id": 1, "text": "a", "completed": false, "createdAt": "2025-12-20T00:00:01Z"}
        ]),
    );

    let output = mytodo(&store_dir)
        .arg("clear-completed")
        .output()
        .expect("failed to run clear-completed command");
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}
