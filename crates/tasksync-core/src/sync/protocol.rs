//! Wire types shared by the sync orchestrator and the batch reconciler

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{QueueItemId, SyncQueueItem, Task};

/// One batch of pending client mutations, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSyncRequest {
    /// Queue items in FIFO order
    pub items: Vec<SyncQueueItem>,
    /// High-water mark of the last successful sync; bounds `server_changes`
    pub client_timestamp: DateTime<Utc>,
}

/// Per-item verdict status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Accepted (or idempotently absorbed); terminally resolved
    Success,
    /// The server copy won last-write-wins; terminally resolved
    Conflict,
    /// Processing failed; the client should retry the item later
    Error,
}

/// Verdict for one submitted queue item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedItem {
    /// The client-assigned queue item id, echoed for correlation
    pub client_id: QueueItemId,
    /// Task id as stored on the server
    pub server_id: String,
    pub status: ItemStatus,
    /// Authoritative server copy, attached on `conflict`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_data: Option<Task>,
    /// Failure message, attached on `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Server reply: one verdict per submitted item (same order), plus the
/// changes this client has not yet seen and the next high-water mark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSyncResponse {
    pub processed_items: Vec<ProcessedItem>,
    pub server_changes: Vec<Task>,
    pub server_timestamp: DateTime<Utc>,
}
