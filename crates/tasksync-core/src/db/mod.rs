//! Storage layer for tasksync

mod connection;
mod meta_store;
mod migrations;
mod queue_store;
mod task_store;

pub use connection::Database;
pub use meta_store::{SqliteSyncMetaStore, SyncMetaStore};
pub use queue_store::{SqliteSyncQueueStore, SyncQueueStore};
pub use task_store::{SqliteTaskStore, TaskStore};
