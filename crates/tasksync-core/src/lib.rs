//! tasksync-core - Core library for tasksync
//!
//! This crate contains the shared models, storage layer, and the batch sync
//! engine used by the tasksync server and CLI.

pub mod db;
pub mod error;
pub mod models;
pub mod sync;
pub mod tasks;

pub use error::{Error, Result};
pub use models::{SyncQueueItem, Task, TaskId};
