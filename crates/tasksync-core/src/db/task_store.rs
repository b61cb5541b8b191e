//! Task store implementation

use crate::error::{Error, Result};
use crate::models::{SyncStatus, Task, TaskId};
use rusqlite::{params, Connection};

/// Trait for task storage operations
///
/// The sync engine is written against this trait so stores can be injected
/// (and mocked in tests) rather than reached through module-level state.
pub trait TaskStore {
    /// Look up a task by id, including soft-deleted ones
    fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>>;

    /// Upsert a task by id in a single atomic statement
    ///
    /// This is the serialization point for concurrent batches touching the
    /// same task id.
    fn save(&self, task: &Task) -> Result<()>;

    /// List non-deleted tasks, most recently updated first
    fn find_active(&self) -> Result<Vec<Task>>;

    /// List tasks with local changes awaiting sync (pending or error)
    fn find_needing_sync(&self) -> Result<Vec<Task>>;

    /// List tasks whose `updated_at` is strictly after the given timestamp,
    /// oldest first
    fn modified_since(&self, timestamp: i64) -> Result<Vec<Task>>;
}

/// `SQLite` implementation of `TaskStore`
pub struct SqliteTaskStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteTaskStore<'a> {
    /// Create a new store with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    const COLUMNS: &'static str = "id, title, description, completed, is_deleted, \
         created_at, updated_at, sync_status, server_id, last_synced_at";

    /// Parse a task from a database row
    fn parse_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
        let id: String = row.get(0)?;
        let sync_status: String = row.get(7)?;
        Ok(Task {
            id: id.parse().unwrap_or_default(),
            title: row.get(1)?,
            description: row.get(2)?,
            completed: row.get::<_, i32>(3)? != 0,
            is_deleted: row.get::<_, i32>(4)? != 0,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
            sync_status: sync_status.parse().unwrap_or(SyncStatus::Pending),
            server_id: row.get(8)?,
            last_synced_at: row.get(9)?,
        })
    }

    fn query_tasks(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(sql)?;
        let tasks = stmt
            .query_map(params, Self::parse_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }
}

impl TaskStore for SqliteTaskStore<'_> {
    fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE id = ?", Self::COLUMNS);
        let result = self
            .conn
            .query_row(&sql, params![id.as_str()], Self::parse_task);

        match result {
            Ok(task) => Ok(Some(task)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, task: &Task) -> Result<()> {
        if task.title.is_empty() {
            return Err(Error::InvalidInput("Task title must not be empty".into()));
        }

        self.conn.execute(
            "INSERT INTO tasks (id, title, description, completed, is_deleted,
                                created_at, updated_at, sync_status, server_id, last_synced_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 description = excluded.description,
                 completed = excluded.completed,
                 is_deleted = excluded.is_deleted,
                 created_at = excluded.created_at,
                 updated_at = excluded.updated_at,
                 sync_status = excluded.sync_status,
                 server_id = excluded.server_id,
                 last_synced_at = excluded.last_synced_at",
            params![
                task.id.as_str(),
                task.title,
                task.description,
                i32::from(task.completed),
                i32::from(task.is_deleted),
                task.created_at,
                task.updated_at,
                task.sync_status.as_str(),
                task.server_id,
                task.last_synced_at,
            ],
        )?;

        Ok(())
    }

    fn find_active(&self) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE is_deleted = 0 ORDER BY updated_at DESC",
            Self::COLUMNS
        );
        self.query_tasks(&sql, [])
    }

    fn find_needing_sync(&self) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE sync_status IN ('pending', 'error')
             ORDER BY updated_at ASC",
            Self::COLUMNS
        );
        self.query_tasks(&sql, [])
    }

    fn modified_since(&self, timestamp: i64) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE updated_at > ? ORDER BY updated_at ASC",
            Self::COLUMNS
        );
        self.query_tasks(&sql, params![timestamp])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_save_and_find_by_id() {
        let db = setup();
        let store = SqliteTaskStore::new(db.connection());

        let task = Task::new("Water plants", Some("the ficus too".to_string()));
        store.save(&task).unwrap();

        let fetched = store.find_by_id(&task.id).unwrap().unwrap();
        assert_eq!(fetched, task);
    }

    #[test]
    fn test_find_by_id_absent() {
        let db = setup();
        let store = SqliteTaskStore::new(db.connection());

        assert!(store.find_by_id(&TaskId::new()).unwrap().is_none());
    }

    #[test]
    fn test_save_is_upsert() {
        let db = setup();
        let store = SqliteTaskStore::new(db.connection());

        let mut task = Task::new("Original", None);
        store.save(&task).unwrap();

        task.title = "Replaced".to_string();
        task.updated_at += 5;
        store.save(&task).unwrap();

        let fetched = store.find_by_id(&task.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Replaced");

        let all = store.modified_since(0).unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_save_rejects_empty_title() {
        let db = setup();
        let store = SqliteTaskStore::new(db.connection());

        let mut task = Task::new("x", None);
        task.title = String::new();
        assert!(store.save(&task).is_err());
    }

    #[test]
    fn test_find_active_excludes_deleted() {
        let db = setup();
        let store = SqliteTaskStore::new(db.connection());

        let kept = Task::new("Kept", None);
        store.save(&kept).unwrap();

        let mut gone = Task::new("Gone", None);
        gone.is_deleted = true;
        store.save(&gone).unwrap();

        let active = store.find_active().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, kept.id);
    }

    #[test]
    fn test_find_needing_sync() {
        let db = setup();
        let store = SqliteTaskStore::new(db.connection());

        let pending = Task::new("Pending", None);
        store.save(&pending).unwrap();

        let mut errored = Task::new("Errored", None);
        errored.sync_status = crate::models::SyncStatus::Error;
        store.save(&errored).unwrap();

        let mut synced = Task::new("Synced", None);
        synced.sync_status = crate::models::SyncStatus::Synced;
        store.save(&synced).unwrap();

        let needing = store.find_needing_sync().unwrap();
        assert_eq!(needing.len(), 2);
        assert!(needing.iter().all(|t| t.id != synced.id));
    }

    #[test]
    fn test_modified_since_is_strict() {
        let db = setup();
        let store = SqliteTaskStore::new(db.connection());

        let mut task = Task::new("Bounded", None);
        task.updated_at = 1_000;
        store.save(&task).unwrap();

        assert!(store.modified_since(1_000).unwrap().is_empty());
        assert_eq!(store.modified_since(999).unwrap().len(), 1);
    }
}
