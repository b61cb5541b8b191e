//! Task model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for a task, using UUID v7 (time-sortable)
///
/// Ids are generated on the client so tasks created offline keep a stable
/// identity across sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Create a new unique task ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Local sync state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Has local changes not yet confirmed by the server
    Pending,
    /// Matches the last server-confirmed state
    Synced,
    /// Last sync attempt for this task failed
    Error,
}

impl SyncStatus {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Synced => "synced",
            Self::Error => "error",
        }
    }
}

impl FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "synced" => Ok(Self::Synced),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown sync status: {other}")),
        }
    }
}

/// A task in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier (client-generated)
    pub id: TaskId,
    /// Short title, non-empty for locally created tasks
    pub title: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Completion flag
    pub completed: bool,
    /// Soft delete flag for sync; terminal except via server overwrite
    pub is_deleted: bool,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms); never decreases for the same id
    pub updated_at: i64,
    /// Local sync state
    pub sync_status: SyncStatus,
    /// Identifier confirmed by the server (equals `id` once synced)
    pub server_id: Option<String>,
    /// Timestamp of the last successful reconciliation (Unix ms)
    pub last_synced_at: Option<i64>,
}

impl Task {
    /// Create a new pending task with the given title and description
    #[must_use]
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: TaskId::new(),
            title: title.into(),
            description,
            completed: false,
            is_deleted: false,
            created_at: now,
            updated_at: now,
            sync_status: SyncStatus::Pending,
            server_id: None,
            last_synced_at: None,
        }
    }
}

/// Partial snapshot of task fields carried by a sync queue item
///
/// Only the fields a mutation touched are set; the reconciler merges the set
/// fields over the server copy when the incoming change wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl TaskData {
    /// Capture a full snapshot of a task (used for create operations)
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: Some(task.title.clone()),
            description: task.description.clone(),
            completed: Some(task.completed),
            is_deleted: Some(task.is_deleted),
            created_at: Some(task.created_at),
            updated_at: Some(task.updated_at),
        }
    }

    /// Capture a deletion tombstone
    #[must_use]
    pub const fn deletion(updated_at: i64) -> Self {
        Self {
            title: None,
            description: None,
            completed: None,
            is_deleted: Some(true),
            created_at: None,
            updated_at: Some(updated_at),
        }
    }

    /// Merge the set fields over an existing task, leaving others untouched
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title.clone_from(title);
        }
        if self.description.is_some() {
            task.description.clone_from(&self.description);
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(is_deleted) = self.is_deleted {
            task.is_deleted = is_deleted;
        }
        if let Some(updated_at) = self.updated_at {
            task.updated_at = updated_at;
        }
    }
}
