//! Sync queue model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{TaskData, TaskId};

/// A unique identifier for a sync queue item, independent of the task id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueItemId(Uuid);

impl QueueItemId {
    /// Create a new unique queue item ID using UUID v7
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

impl Default for QueueItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QueueItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The kind of local mutation a queue item carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
}

impl SyncOperation {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl FromStr for SyncOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown sync operation: {other}")),
        }
    }
}

/// A pending local mutation awaiting transmission to the server
///
/// Owned by the sync queue store from creation until explicit removal;
/// immutable after creation except for retry bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncQueueItem {
    /// Queue item identifier, used by the server to correlate verdicts
    pub id: QueueItemId,
    /// The task this mutation applies to
    pub task_id: TaskId,
    /// Mutation kind
    pub operation: SyncOperation,
    /// Partial snapshot of the fields the mutation touched
    pub data: TaskData,
    /// Enqueue timestamp (Unix ms); defines FIFO order within a batch
    pub created_at: i64,
    /// Number of failed transmission attempts
    #[serde(default)]
    pub retry_count: u32,
    /// Message from the last failed attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl SyncQueueItem {
    /// Create a new queue item for the given task mutation
    #[must_use]
    pub fn new(task_id: TaskId, operation: SyncOperation, data: TaskData) -> Self {
        Self {
            id: QueueItemId::new(),
            task_id,
            operation,
            data,
            created_at: chrono::Utc::now().timestamp_millis(),
            retry_count: 0,
            error_message: None,
        }
    }
}
