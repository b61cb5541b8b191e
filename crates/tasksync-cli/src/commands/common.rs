use std::env;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tasksync_core::db::Database;
use tasksync_core::models::Task;
use tasksync_core::TaskId;

use crate::error::CliError;

/// Resolve the database path: flag, then `TASKSYNC_DB`, then a local default
pub fn resolve_db_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| env::var_os("TASKSYNC_DB").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("tasksync.db"))
}

pub fn open_database(db_path: &Path) -> Result<Database, CliError> {
    Ok(Database::open(db_path)?)
}

/// Resolve a task by full id or unique id prefix over the active tasks
pub fn resolve_task(tasks: &[Task], query: &str) -> Result<Task, CliError> {
    let query = query.trim();
    if let Ok(id) = query.parse::<TaskId>() {
        if let Some(task) = tasks.iter().find(|t| t.id == id) {
            return Ok(task.clone());
        }
    }

    let matching: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.id.as_str().starts_with(query))
        .collect();

    match matching.len() {
        0 => Err(CliError::TaskNotFound(query.to_string())),
        1 => Ok(matching[0].clone()),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|t| t.id.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousTaskId(format!(
                "Task id prefix '{query}' is ambiguous; candidates: {options}"
            )))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskListItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub updated_at: i64,
    pub updated_at_iso: String,
    pub sync_status: String,
}

pub fn task_to_list_item(task: &Task) -> TaskListItem {
    TaskListItem {
        id: task.id.as_str(),
        title: task.title.clone(),
        description: task.description.clone(),
        completed: task.completed,
        updated_at: task.updated_at,
        updated_at_iso: format_timestamp(task.updated_at),
        sync_status: task.sync_status.as_str().to_string(),
    }
}

pub fn format_task_lines(tasks: &[Task]) -> Vec<String> {
    tasks
        .iter()
        .map(|task| {
            let marker = if task.completed { "x" } else { " " };
            let short_id: String = task.id.as_str().chars().take(8).collect();
            let mut line = format!("[{marker}] {short_id}  {}", task.title);
            if let Some(description) = &task.description {
                line.push_str(&format!("  ({description})"));
            }
            line
        })
        .collect()
}

pub fn format_timestamp(unix_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(unix_ms)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_task_by_unique_prefix() {
        // UUID v7 ids created in the same millisecond share their first 13
        // characters (the timestamp field), so a unique prefix has to reach
        // into the random bits. Drop only the tail of the id.
        let tasks = vec![Task::new("One", None), Task::new("Two", None)];
        let target = &tasks[0];
        let id = target.id.as_str();
        let prefix = &id[..id.len() - 4];

        let resolved = resolve_task(&tasks, prefix).unwrap();
        assert_eq!(resolved.id, target.id);
    }

    #[test]
    fn test_resolve_task_unknown_prefix() {
        let tasks = vec![Task::new("One", None)];
        assert!(matches!(
            resolve_task(&tasks, "zzzz"),
            Err(CliError::TaskNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_task_ambiguous_prefix() {
        // UUID v7 ids share a timestamp prefix when created back to back
        let tasks = vec![Task::new("One", None), Task::new("Two", None)];
        let shared: String = tasks[0]
            .id
            .as_str()
            .chars()
            .zip(tasks[1].id.as_str().chars())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a)
            .collect();

        if !shared.is_empty() {
            let err = resolve_task(&tasks, &shared).unwrap_err();
            let CliError::AmbiguousTaskId(message) = err else {
                panic!("expected AmbiguousTaskId, got {err}");
            };
            // The hint lists full ids; same-millisecond ids would be
            // indistinguishable if truncated to their shared prefix.
            assert!(message.contains(&tasks[0].id.as_str()));
            assert!(message.contains(&tasks[1].id.as_str()));
        }
    }

    #[test]
    fn test_format_task_lines() {
        let mut task = Task::new("Write report", Some("quarterly".to_string()));
        task.completed = true;
        let lines = format_task_lines(&[task]);
        assert!(lines[0].starts_with("[x] "));
        assert!(lines[0].contains("Write report"));
        assert!(lines[0].ends_with("(quarterly)"));
    }
}
