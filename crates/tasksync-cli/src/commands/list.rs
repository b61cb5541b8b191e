use std::path::Path;

use tasksync_core::db::{SqliteSyncQueueStore, SqliteTaskStore};
use tasksync_core::tasks::TaskService;

use crate::commands::common::{format_task_lines, open_database, task_to_list_item, TaskListItem};
use crate::error::CliError;

pub fn run_list(all: bool, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let tasks = SqliteTaskStore::new(db.connection());
    let queue = SqliteSyncQueueStore::new(db.connection());
    let service = TaskService::new(&tasks, &queue);

    let mut listed = service.list_active()?;
    if !all {
        listed.retain(|task| !task.completed);
    }

    if as_json {
        let json_items = listed
            .iter()
            .map(task_to_list_item)
            .collect::<Vec<TaskListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if listed.is_empty() {
        println!("No tasks.");
    } else {
        for line in format_task_lines(&listed) {
            println!("{line}");
        }
    }

    Ok(())
}
