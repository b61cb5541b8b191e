//! Task operations: thin CRUD that pairs every mutation with a queue entry
//!
//! Each write goes to the task store and appends a matching item to the sync
//! queue, so offline mutations are transmitted on the next sync.

use crate::db::{SyncQueueStore, TaskStore};
use crate::error::{Error, Result};
use crate::models::{SyncOperation, SyncQueueItem, SyncStatus, Task, TaskData, TaskId};

/// Fields an update may change; unset fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

/// Thin CRUD over the task store and sync queue
pub struct TaskService<'a, T: TaskStore, Q: SyncQueueStore> {
    tasks: &'a T,
    queue: &'a Q,
}

impl<'a, T: TaskStore, Q: SyncQueueStore> TaskService<'a, T, Q> {
    pub const fn new(tasks: &'a T, queue: &'a Q) -> Self {
        Self { tasks, queue }
    }

    /// Create a new task and enqueue it for sync
    pub fn create(&self, title: &str, description: Option<String>) -> Result<Task> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("Task title must not be empty".into()));
        }

        let task = Task::new(title, description);
        self.tasks.save(&task)?;
        self.queue.enqueue(&SyncQueueItem::new(
            task.id,
            SyncOperation::Create,
            TaskData::from_task(&task),
        ))?;
        tracing::debug!(task_id = %task.id, "Created task");
        Ok(task)
    }

    /// Get a task by id (soft-deleted tasks are reported as absent)
    pub fn get(&self, id: &TaskId) -> Result<Option<Task>> {
        Ok(self
            .tasks
            .find_by_id(id)?
            .filter(|task| !task.is_deleted))
    }

    /// List non-deleted tasks, most recently updated first
    pub fn list_active(&self) -> Result<Vec<Task>> {
        self.tasks.find_active()
    }

    /// Apply a patch to an existing task and enqueue the change
    pub fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task> {
        let mut task = self
            .get(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if let Some(title) = &patch.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(Error::InvalidInput("Task title must not be empty".into()));
            }
            task.title = title.to_string();
        }
        if let Some(description) = &patch.description {
            task.description = Some(description.clone());
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }

        task.updated_at = next_timestamp(task.updated_at);
        task.sync_status = SyncStatus::Pending;
        self.tasks.save(&task)?;

        let data = TaskData {
            title: patch.title.as_ref().map(|_| task.title.clone()),
            description: patch.description.clone(),
            completed: patch.completed,
            updated_at: Some(task.updated_at),
            ..TaskData::default()
        };
        self.queue
            .enqueue(&SyncQueueItem::new(task.id, SyncOperation::Update, data))?;
        tracing::debug!(task_id = %task.id, "Updated task");
        Ok(task)
    }

    /// Mark a task completed or reopened
    pub fn set_completed(&self, id: &TaskId, completed: bool) -> Result<Task> {
        self.update(
            id,
            &TaskPatch {
                completed: Some(completed),
                ..TaskPatch::default()
            },
        )
    }

    /// Soft-delete a task and enqueue a tombstone
    ///
    /// Deletion is terminal: no local mutation resets the flag. Only a
    /// server-originated overwrite can bring the task back.
    pub fn delete(&self, id: &TaskId) -> Result<()> {
        let mut task = self
            .get(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        task.is_deleted = true;
        task.updated_at = next_timestamp(task.updated_at);
        task.sync_status = SyncStatus::Pending;
        self.tasks.save(&task)?;

        self.queue.enqueue(&SyncQueueItem::new(
            task.id,
            SyncOperation::Delete,
            TaskData::deletion(task.updated_at),
        ))?;
        tracing::debug!(task_id = %task.id, "Soft-deleted task");
        Ok(())
    }
}

/// Next `updated_at` for a task: wall clock, but strictly after the previous
/// value so rapid successive writes stay ordered.
fn next_timestamp(previous: i64) -> i64 {
    chrono::Utc::now().timestamp_millis().max(previous + 1)
}
