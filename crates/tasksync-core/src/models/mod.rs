//! Data models for tasksync

mod queue;
mod task;

pub use queue::{QueueItemId, SyncOperation, SyncQueueItem};
pub use task::{SyncStatus, Task, TaskData, TaskId};
