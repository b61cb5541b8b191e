use std::path::Path;

use tasksync_core::db::{SqliteSyncQueueStore, SqliteTaskStore};
use tasksync_core::tasks::TaskService;

use crate::commands::common::{open_database, resolve_task};
use crate::error::CliError;

pub fn run_set_completed(id: &str, completed: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let tasks = SqliteTaskStore::new(db.connection());
    let queue = SqliteSyncQueueStore::new(db.connection());
    let service = TaskService::new(&tasks, &queue);

    let task = resolve_task(&service.list_active()?, id)?;
    service.set_completed(&task.id, completed)?;
    println!("{}", task.id);
    Ok(())
}
