use super::KeyValueStorage;
use crate::error::AppError;
use crate::model::Task;
use std::collections::HashSet;

/// Fixed key the whole task sequence is stored under.
pub const TASKS_KEY: &str = "pinnacle-todo-tasks";

/// Largest id a JavaScript number holds exactly (2^53 - 1).
pub const MAX_TASK_ID: u64 = (1 << 53) - 1;

pub fn encode_tasks(tasks: &[Task]) -> Result<String, AppError> {
    serde_json::to_string_pretty(tasks).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn decode_tasks(content: &str) -> Result<Vec<Task>, AppError> {
    let tasks: Vec<Task> =
        serde_json::from_str(content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    let mut seen = HashSet::with_capacity(tasks.len());
    for task in &tasks {
        if task.text.trim().is_empty() {
            return Err(AppError::invalid_data(format!(
                "task {} has empty text",
                task.id
            )));
        }
        if task.id > MAX_TASK_ID {
            return Err(AppError::invalid_data(format!(
                "task id {} is out of range",
                task.id
            )));
        }
        if !seen.insert(task.id) {
            return Err(AppError::invalid_data(format!(
                "duplicate task id {}",
                task.id
            )));
        }
    }

    Ok(tasks)
}

/// Reads the stored sequence; a missing or blank entry is an empty list.
pub fn load_tasks<S: KeyValueStorage + ?Sized>(storage: &S) -> Result<Vec<Task>, AppError> {
    match storage.load(TASKS_KEY)? {
        Some(content) if !content.trim().is_empty() => decode_tasks(&content),
        _ => Ok(Vec::new()),
    }
}

pub fn save_tasks<S: KeyValueStorage + ?Sized>(
    storage: &mut S,
    tasks: &[Task],
) -> Result<(), AppError> {
    let content = encode_tasks(tasks)?;
    storage.save(TASKS_KEY, &content)
}

#[cfg(test)]
mod tests {
    use super::{MAX_TASK_ID, TASKS_KEY, decode_tasks, load_tasks, save_tasks};
    use crate::model::Task;
    use crate::storage::{KeyValueStorage, MemoryStorage};

    fn task(id: u64, text: &str) -> Task {
        Task {
            id,
            text: text.to_string(),
            completed: false,
            created_at: "2025-12-20T00:00:00Z".to_string(),
            completed_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let mut storage = MemoryStorage::new();
        let mut done = task(2, "Walk dog");
        done.completed = true;
        done.completed_at = Some("2025-12-20T02:00:00Z".to_string());
        done.updated_at = Some("2025-12-20T01:00:00Z".to_string());
        let tasks = vec![done, task(1, "Buy milk")];

        save_tasks(&mut storage, &tasks).unwrap();
        let loaded = load_tasks(&storage).unwrap();

        assert_eq!(loaded, tasks);
    }

    #[test]
    fn stores_a_plain_json_array_under_the_fixed_key() {
        let mut storage = MemoryStorage::new();
        save_tasks(&mut storage, &[task(1, "Buy milk")]).unwrap();

        let raw = storage.load(TASKS_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert!(value.is_array());
        assert_eq!(value[0]["text"], "Buy milk");
        assert_eq!(value[0]["completed"], false);
    }

    #[test]
    fn missing_or_blank_entry_loads_empty() {
        assert!(load_tasks(&MemoryStorage::new()).unwrap().is_empty());

        let blank = MemoryStorage::new().with_entry(TASKS_KEY, "  ");
        assert!(load_tasks(&blank).unwrap().is_empty());
    }

    #[test]
    fn accepts_browser_written_records() {
        let content = r#"[
            {"id": 1766192400123, "text": "Walk dog", "completed": true,
             "createdAt": "2025-12-20T01:00:00.123Z", "completedAt": "2025-12-20T02:00:00.000Z"},
            {"id": 1766188800000, "text": "Buy milk", "completed": false,
             "createdAt": "2025-12-20T00:00:00.000Z", "completedAt": null,
             "updatedAt": "2025-12-20T00:30:00.000Z"}
        ]"#;

        let tasks = decode_tasks(content).unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, 1766192400123);
        assert!(tasks[0].completed);
        assert_eq!(tasks[1].completed_at, None);
        assert_eq!(
            tasks[1].updated_at.as_deref(),
            Some("2025-12-20T00:30:00.000Z")
        );
    }

    #[test]
    fn rejects_invalid_json() {
        let err = decode_tasks("{ not json").unwrap_err();
        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn rejects_blank_task_text() {
        let content = r#"[{"id": 1, "text": "   ", "createdAt": "2025-12-20T00:00:00Z"}]"#;
        let err = decode_tasks(content).unwrap_err();
        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let content = r#"[
            {"id": 1, "text": "a", "createdAt": "2025-12-20T00:00:00Z"},
            {"id": 1, "text": "b", "createdAt": "2025-12-20T00:00:00Z"}
        ]"#;
        let err = decode_tasks(content).unwrap_err();
        assert!(err.message().contains("duplicate"));
    }

    #[test]
    fn rejects_ids_beyond_safe_integer_range() {
        let content = format!(
            r#"[{{"id": {}, "text": "a", "createdAt": "2025-12-20T00:00:00Z"}}]"#,
            u64::MAX
        );
        let err = decode_tasks(&content).unwrap_err();
        assert!(err.message().contains("out of range"));

        let largest = format!(
            r#"[{{"id": {MAX_TASK_ID}, "text": "a", "createdAt": "2025-12-20T00:00:00Z"}}]"#
        );
        assert_eq!(decode_tasks(&largest).unwrap()[0].id, MAX_TASK_ID);
    }
}
