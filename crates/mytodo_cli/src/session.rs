//! Terminal presentation adapter: runs commands against one open [`TaskStore`],
//! reports outcome notices and redraws the list after every change.

use crate::cli::Command;
use crate::render::{self, View};
use mytodo_core::config::{Config, Palette};
use mytodo_core::error::AppError;
use mytodo_core::model::{Task, TaskId};
use mytodo_core::notify::{Notice, NoticeKind, Notifier};
use mytodo_core::storage::KeyValueStorage;
use mytodo_core::store::{EditOutcome, StoreWarning, TaskStore};
use std::io::Write;
use tracing::debug;

pub struct Session<S: KeyValueStorage, W: Write> {
    store: TaskStore<S>,
    palette: Palette,
    notifier: Box<dyn Notifier>,
    out: W,
    interactive: bool,
}

impl<S: KeyValueStorage, W: Write> Session<S, W> {
    pub fn open(
        storage: S,
        config: &Config,
        notifier: Box<dyn Notifier>,
        out: W,
        interactive: bool,
    ) -> Self {
        let mut store = TaskStore::open(storage);
        if let Some(filter) = config.default_filter {
            store.set_filter(filter);
        }

        Self {
            store,
            palette: config.theme.palette(),
            notifier,
            out,
            interactive,
        }
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    /// Runs one command. Storage warnings are reported even when the command fails.
    pub fn execute(&mut self, command: Command, json: bool) -> Result<(), AppError> {
        debug!(?command, "executing command");
        let redraw = command.is_mutation() && self.interactive && !json;
        let result = self.apply(command, json);
        self.report_warnings(json)?;

        result?;
        if redraw {
            self.print_view()?;
        }
        Ok(())
    }

    /// Reports warnings queued outside a command, such as a failed load at startup.
    pub fn report_warnings(&mut self, json: bool) -> Result<(), AppError> {
        let warnings = self.store.take_warnings();
        self.emit_warnings(warnings, json)
    }

    /// Shows a failed command on stderr and as a desktop notice.
    pub fn report_error(&self, err: &AppError) {
        eprintln!(
            "{}",
            self.palette.paint(NoticeKind::Error, &format!("ERROR: {err}"))
        );
        self.notifier.notify(&Notice::error(err.message())).ok();
    }

    pub fn print_view(&mut self) -> Result<(), AppError> {
        let rendered = render::render_view(&self.view(), &self.palette);
        write!(self.out, "{rendered}")?;
        Ok(())
    }

    /// Retries any failed save, reports what is still failing, and returns the output sink.
    pub fn close(mut self, json: bool) -> Result<W, AppError> {
        self.store.flush();
        self.report_warnings(json)?;
        Ok(self.out)
    }

    fn apply(&mut self, command: Command, json: bool) -> Result<(), AppError> {
        if !self.interactive && command.needs_edit_mode() {
            return Err(AppError::invalid_input(
                "edit mode only lasts for an interactive session; use edit <id> <text>",
            ));
        }

        match command {
            Command::Add { text } => {
                let task = self.store.add(&text.join(" ")).map_err(|err| match err {
                    AppError::InvalidInput(_) => AppError::invalid_input("Please enter a task"),
                    other => other,
                })?;
                self.report_task(&task, Notice::success("Task added successfully!"), json)
            }
            Command::Toggle { id } => {
                let task = self.store.toggle_complete(id)?.ok_or_else(|| missing(id))?;
                let notice = if task.completed {
                    Notice::success("Task completed!")
                } else {
                    Notice::success("Task marked as active")
                };
                self.report_task(&task, notice, json)
            }
            Command::Edit { id, text } => {
                let task = self.store.start_edit(id).ok_or_else(|| missing(id))?;
                if text.is_empty() {
                    let notice = Notice::info(format!(
                        "Editing \"{}\": save <new text> to update it, cancel to stop",
                        task.text
                    ));
                    return self.report_task(&task, notice, json);
                }
                self.finish_edit(id, &text.join(" "), json)
            }
            Command::Save { text } => {
                let id = self
                    .store
                    .editing_task_id()
                    .ok_or_else(|| AppError::invalid_input("no task is being edited"))?;
                self.finish_edit(id, &text.join(" "), json)
            }
            Command::Cancel => {
                if self.store.cancel_edit().is_some() && !json {
                    self.emit(Notice::info("Edit cancelled"))?;
                }
                Ok(())
            }
            Command::Delete { id } => {
                let task = self.store.delete(id).ok_or_else(|| missing(id))?;
                self.report_task(&task, Notice::success("Task deleted successfully!"), json)
            }
            Command::ClearCompleted => {
                let cleared = self.store.clear_completed();
                if json {
                    return self.print_json(serde_json::json!({ "cleared": cleared }));
                }
                if cleared > 0 {
                    self.emit(Notice::success(format!(
                        "{cleared} completed task(s) cleared!"
                    )))?;
                }
                Ok(())
            }
            Command::Filter { filter } => {
                self.store.set_filter(filter);
                self.show_view(json)
            }
            Command::List { filter } => {
                if let Some(filter) = filter {
                    self.store.set_filter(filter);
                }
                self.show_view(json)
            }
            Command::Count => {
                if json {
                    return self.print_json(serde_json::json!({
                        "active_count": self.store.active_count(),
                        "completed_count": self.store.completed_count(),
                    }));
                }
                let label = render::remaining_label(self.store.active_count());
                writeln!(self.out, "{label}")?;
                Ok(())
            }
        }
    }

    fn finish_edit(&mut self, id: TaskId, text: &str, json: bool) -> Result<(), AppError> {
        let outcome = self.store.finish_edit(id, text).map_err(|err| match err {
            AppError::InvalidInput(_) => AppError::invalid_input("Task text cannot be empty"),
            other => other,
        })?;

        match outcome {
            EditOutcome::Updated(task) => {
                self.report_task(&task, Notice::success("Task updated successfully!"), json)
            }
            EditOutcome::Unchanged => match self.store.get(id) {
                Some(task) if json => {
                    let value = render::task_json(task);
                    self.print_json(value)
                }
                _ => Ok(()),
            },
            EditOutcome::Stale => Err(missing(id)),
        }
    }

    fn show_view(&mut self, json: bool) -> Result<(), AppError> {
        if json {
            let value = render::view_json(&self.view());
            return self.print_json(value);
        }
        self.print_view()
    }

    fn view(&self) -> View<'_> {
        View {
            filter: self.store.current_filter(),
            tasks: self.store.filtered_view(),
            editing_task_id: self.store.editing_task_id(),
            active_count: self.store.active_count(),
            completed_count: self.store.completed_count(),
        }
    }

    fn report_task(&mut self, task: &Task, notice: Notice, json: bool) -> Result<(), AppError> {
        if json {
            return self.print_json(render::task_json(task));
        }
        self.emit(notice)
    }

    fn emit_warnings(&mut self, warnings: Vec<StoreWarning>, json: bool) -> Result<(), AppError> {
        for warning in warnings {
            let notice = warning_notice(&warning);
            if json {
                eprintln!("WARNING: {}", warning.error());
                continue;
            }
            self.emit(notice)?;
        }
        Ok(())
    }

    fn emit(&mut self, notice: Notice) -> Result<(), AppError> {
        writeln!(
            self.out,
            "{}",
            self.palette.paint(notice.kind, &notice.message)
        )?;

        if let Err(err) = self.notifier.notify(&notice) {
            let warning = self
                .palette
                .paint(NoticeKind::Warning, &format!("desktop notice failed: {err}"));
            writeln!(self.out, "{warning}")?;
        }
        Ok(())
    }

    fn print_json(&mut self, value: serde_json::Value) -> Result<(), AppError> {
        writeln!(self.out, "{value}")?;
        Ok(())
    }
}

fn warning_notice(warning: &StoreWarning) -> Notice {
    match warning {
        StoreWarning::LoadFailed(err) => {
            Notice::warning(format!("Failed to load saved tasks ({})", err.message()))
        }
        StoreWarning::SaveFailed(err) => {
            Notice::warning(format!("Failed to save tasks ({})", err.message()))
        }
    }
}

fn missing(id: TaskId) -> AppError {
    AppError::not_found(format!("task {id} not found"))
}
