use mytodo_core::config::Palette;
use mytodo_core::model::{Filter, Task, TaskId};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Everything the terminal needs to redraw the list.
pub struct View<'a> {
    pub filter: Filter,
    pub tasks: Vec<&'a Task>,
    pub editing_task_id: Option<TaskId>,
    pub active_count: usize,
    pub completed_count: usize,
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: TaskId,
    #[tabled(rename = "Done")]
    done: &'static str,
    #[tabled(rename = "Task")]
    text: String,
    #[tabled(rename = "Created")]
    created: String,
}

pub fn remaining_label(active_count: usize) -> String {
    if active_count == 1 {
        "1 task remaining".to_string()
    } else {
        format!("{active_count} tasks remaining")
    }
}

pub fn empty_state(filter: Filter) -> (&'static str, &'static str) {
    match filter {
        Filter::Active => ("No active tasks", "All tasks are completed!"),
        Filter::Completed => (
            "No completed tasks",
            "Complete some tasks to see them here!",
        ),
        Filter::All => ("No tasks yet", "Add a task above to get started!"),
    }
}

pub fn render_view(view: &View<'_>, palette: &Palette) -> String {
    let mut rendered = String::new();

    if view.tasks.is_empty() {
        let (title, text) = empty_state(view.filter);
        rendered.push_str(title);
        rendered.push('\n');
        rendered.push_str(&palette.mutedize(text));
        rendered.push('\n');
    } else {
        let offset = local_offset();
        let rows = view.tasks.iter().map(|task| TaskRow {
            id: task.id,
            done: if task.completed { "[x]" } else { "[ ]" },
            text: if view.editing_task_id == Some(task.id) {
                format!("{} (editing)", task.text)
            } else {
                task.text.clone()
            },
            created: display_timestamp(&task.created_at, offset),
        });
        let mut table = Table::new(rows);
        table.with(Style::psql());
        rendered.push_str(&table.to_string());
        rendered.push('\n');
    }

    rendered.push_str(&format!(
        "[{}] {}",
        view.filter,
        remaining_label(view.active_count)
    ));
    if view.completed_count > 0 {
        rendered.push_str(&palette.mutedize(&format!(
            " | {} completed (clear-completed to remove)",
            view.completed_count
        )));
    }
    rendered.push('\n');

    rendered
}

pub fn task_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "id": task.id,
        "text": task.text,
        "completed": task.completed,
        "createdAt": task.created_at,
        "completedAt": task.completed_at,
        "updatedAt": task.updated_at,
    })
}

pub fn view_json(view: &View<'_>) -> serde_json::Value {
    serde_json::json!({
        "filter": view.filter,
        "tasks": view.tasks.iter().map(|task| task_json(task)).collect::<Vec<_>>(),
        "editing_task_id": view.editing_task_id,
        "active_count": view.active_count,
        "completed_count": view.completed_count,
    })
}

fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Falls back to the stored string when it is not RFC 3339.
fn display_timestamp(raw: &str, offset: UtcOffset) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .and_then(|parsed| parsed.to_offset(offset).format(format).ok())
        .unwrap_or_else(|| raw.to_string())
}
