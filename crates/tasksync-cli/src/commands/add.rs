use std::path::Path;

use tasksync_core::db::{SqliteSyncQueueStore, SqliteTaskStore};
use tasksync_core::tasks::TaskService;

use crate::commands::common::open_database;
use crate::error::CliError;

pub fn run_add(
    title_parts: &[String],
    description: Option<String>,
    db_path: &Path,
) -> Result<(), CliError> {
    let title = title_parts.join(" ");
    if title.trim().is_empty() {
        return Err(CliError::EmptyTitle);
    }

    let db = open_database(db_path)?;
    let tasks = SqliteTaskStore::new(db.connection());
    let queue = SqliteSyncQueueStore::new(db.connection());
    let service = TaskService::new(&tasks, &queue);

    let task = service.create(&title, description)?;
    println!("{}", task.id);
    Ok(())
}
