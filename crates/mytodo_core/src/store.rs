//! The task store: ordered tasks, the active filter and the single in-progress edit.
//!
//! Every operation that changes the task sequence writes it back through the
//! [`KeyValueStorage`] the store was opened with. Storage failures never abort an
//! operation; they are queued as [`StoreWarning`]s for the presentation layer to
//! drain with [`TaskStore::take_warnings`].

use crate::error::AppError;
use crate::model::{Filter, Task, TaskId};
use crate::storage::KeyValueStorage;
use crate::storage::json_store;
use std::collections::HashMap;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Idle,
    Editing(TaskId),
}

impl EditState {
    pub fn editing_id(self) -> Option<TaskId> {
        match self {
            Self::Idle => None,
            Self::Editing(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Updated(Task),
    /// The new text matched the old one; edit mode was left without a write.
    Unchanged,
    /// The id was not the one being edited.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWarning {
    LoadFailed(AppError),
    SaveFailed(AppError),
}

impl StoreWarning {
    pub fn error(&self) -> &AppError {
        match self {
            Self::LoadFailed(err) | Self::SaveFailed(err) => err,
        }
    }
}

pub struct TaskStore<S: KeyValueStorage> {
    storage: S,
    tasks: Vec<Task>,
    index: HashMap<TaskId, usize>,
    filter: Filter,
    edit: EditState,
    newest_id: Option<TaskId>,
    unsaved: bool,
    warnings: Vec<StoreWarning>,
}

impl<S: KeyValueStorage> TaskStore<S> {
    /// Loads the saved sequence from `storage`. Unreadable or malformed data starts
    /// an empty store and queues a [`StoreWarning::LoadFailed`].
    pub fn open(storage: S) -> Self {
        let mut store = Self {
            storage,
            tasks: Vec::new(),
            index: HashMap::new(),
            filter: Filter::default(),
            edit: EditState::Idle,
            newest_id: None,
            unsaved: false,
            warnings: Vec::new(),
        };

        match json_store::load_tasks(&store.storage) {
            Ok(tasks) => {
                debug!(count = tasks.len(), "loaded saved tasks");
                store.tasks = tasks;
            }
            Err(err) => {
                warn!(error = %err, "discarding saved tasks");
                store.warnings.push(StoreWarning::LoadFailed(err));
            }
        }

        store.newest_id = store.tasks.iter().map(|task| task.id).max();
        store.reindex();
        store
    }

    /// Retries a failed write; a second failure is queued like any other.
    pub fn flush(&mut self) {
        if self.unsaved {
            self.persist();
        }
    }

    /// Retries a failed write, then hands back the storage and any undrained warnings.
    pub fn close(mut self) -> (S, Vec<StoreWarning>) {
        self.flush();
        let warnings = self.take_warnings();
        (self.storage, warnings)
    }

    pub fn add(&mut self, text: &str) -> Result<Task, AppError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("task text is required"));
        }

        let now = OffsetDateTime::now_utc();
        let created_at = timestamp(now)?;
        let task = Task {
            id: self.next_id(now),
            text: trimmed.to_string(),
            completed: false,
            created_at,
            completed_at: None,
            updated_at: None,
        };

        self.tasks.insert(0, task.clone());
        self.reindex();
        self.persist();
        debug!(id = task.id, "added task");

        Ok(task)
    }

    pub fn toggle_complete(&mut self, id: TaskId) -> Result<Option<Task>, AppError> {
        let Some(&position) = self.index.get(&id) else {
            debug!(id, "toggle ignored, task not found");
            return Ok(None);
        };

        let completed_at = if self.tasks[position].completed {
            None
        } else {
            Some(timestamp(OffsetDateTime::now_utc())?)
        };

        let task = &mut self.tasks[position];
        task.completed = !task.completed;
        task.completed_at = completed_at;
        let toggled = task.clone();

        self.persist();
        debug!(id, completed = toggled.completed, "toggled task");

        Ok(Some(toggled))
    }

    /// Enters edit mode for `id`, implicitly cancelling any other edit.
    pub fn start_edit(&mut self, id: TaskId) -> Option<Task> {
        let task = self.get(id)?.clone();

        if let EditState::Editing(previous) = self.edit
            && previous != id
        {
            debug!(previous, "cancelled edit for another task");
        }
        self.edit = EditState::Editing(id);

        Some(task)
    }

    /// Empty text is rejected and leaves edit mode active.
    pub fn finish_edit(&mut self, id: TaskId, new_text: &str) -> Result<EditOutcome, AppError> {
        if self.edit != EditState::Editing(id) {
            return Ok(EditOutcome::Stale);
        }

        let Some(&position) = self.index.get(&id) else {
            self.edit = EditState::Idle;
            return Ok(EditOutcome::Stale);
        };

        let trimmed = new_text.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("task text cannot be empty"));
        }

        if trimmed == self.tasks[position].text {
            self.edit = EditState::Idle;
            return Ok(EditOutcome::Unchanged);
        }

        let updated_at = timestamp(OffsetDateTime::now_utc())?;
        let task = &mut self.tasks[position];
        task.text = trimmed.to_string();
        task.updated_at = Some(updated_at);
        let updated = task.clone();

        self.edit = EditState::Idle;
        self.persist();
        debug!(id, "updated task text");

        Ok(EditOutcome::Updated(updated))
    }

    /// Leaves edit mode, returning the id that was being edited.
    pub fn cancel_edit(&mut self) -> Option<TaskId> {
        std::mem::take(&mut self.edit).editing_id()
    }

    pub fn delete(&mut self, id: TaskId) -> Option<Task> {
        let position = *self.index.get(&id)?;
        let removed = self.tasks.remove(position);

        if self.edit == EditState::Editing(id) {
            self.edit = EditState::Idle;
        }
        self.reindex();
        self.persist();
        debug!(id, "deleted task");

        Some(removed)
    }

    /// Removes every completed task and returns how many were removed.
    pub fn clear_completed(&mut self) -> usize {
        let cleared = self.completed_count();
        if cleared == 0 {
            return 0;
        }

        self.tasks.retain(|task| !task.completed);
        self.reindex();
        if let Some(id) = self.edit.editing_id()
            && !self.index.contains_key(&id)
        {
            self.edit = EditState::Idle;
        }
        self.persist();
        debug!(cleared, "cleared completed tasks");

        cleared
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn current_filter(&self) -> Filter {
        self.filter
    }

    /// Tasks matching the current filter, in store order.
    pub fn filtered_view(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| self.filter.matches(task))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.is_active()).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.len() - self.active_count()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.index.get(&id).map(|&position| &self.tasks[position])
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn edit_state(&self) -> EditState {
        self.edit
    }

    pub fn editing_task_id(&self) -> Option<TaskId> {
        self.edit.editing_id()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Drains the warnings queued since the last call.
    pub fn take_warnings(&mut self) -> Vec<StoreWarning> {
        std::mem::take(&mut self.warnings)
    }

    fn persist(&mut self) {
        match json_store::save_tasks(&mut self.storage, &self.tasks) {
            Ok(()) => self.unsaved = false,
            Err(err) => {
                warn!(error = %err, "failed to save tasks");
                self.unsaved = true;
                self.warnings.push(StoreWarning::SaveFailed(err));
            }
        }
    }

    fn next_id(&mut self, now: OffsetDateTime) -> TaskId {
        let millis = u64::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or_default();
        let id = match self.newest_id {
            Some(newest) if millis <= newest => newest + 1,
            _ => millis,
        };
        self.newest_id = Some(id);
        id
    }

    fn reindex(&mut self) {
        self.index = self
            .tasks
            .iter()
            .enumerate()
            .map(|(position, task)| (task.id, position))
            .collect();
    }
}

fn timestamp(now: OffsetDateTime) -> Result<String, AppError> {
    now.format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}
