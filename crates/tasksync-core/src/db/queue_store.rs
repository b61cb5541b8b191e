//! Sync queue store implementation

use crate::error::Result;
use crate::models::{QueueItemId, SyncQueueItem};
use rusqlite::{params, Connection};

/// Trait for the durable log of pending local mutations
///
/// Append-only and FIFO-ordered; items are removed only when the server
/// terminally resolves them, and mutated only for retry bookkeeping.
pub trait SyncQueueStore {
    /// Append a new pending mutation
    fn enqueue(&self, item: &SyncQueueItem) -> Result<()>;

    /// All pending items, oldest first
    fn pending(&self) -> Result<Vec<SyncQueueItem>>;

    /// Remove a terminally resolved item
    fn remove(&self, id: &QueueItemId) -> Result<()>;

    /// Record a failed attempt: bump `retry_count`, store the message
    fn record_failure(&self, id: &QueueItemId, message: &str) -> Result<()>;
}

/// `SQLite` implementation of `SyncQueueStore`
pub struct SqliteSyncQueueStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSyncQueueStore<'a> {
    /// Create a new store with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a queue item from a database row
    fn parse_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<SyncQueueItem> {
        let id: String = row.get(0)?;
        let task_id: String = row.get(1)?;
        let operation: String = row.get(2)?;
        let data: String = row.get(3)?;
        Ok(SyncQueueItem {
            id: id.parse().unwrap_or_default(),
            task_id: task_id.parse().unwrap_or_default(),
            operation: operation.parse().unwrap_or(crate::models::SyncOperation::Update),
            data: serde_json::from_str(&data).unwrap_or_default(),
            created_at: row.get(4)?,
            retry_count: row.get(5)?,
            error_message: row.get(6)?,
        })
    }
}

impl SyncQueueStore for SqliteSyncQueueStore<'_> {
    fn enqueue(&self, item: &SyncQueueItem) -> Result<()> {
        let data = serde_json::to_string(&item.data)?;
        self.conn.execute(
            "INSERT INTO sync_queue (id, task_id, operation, data, created_at, retry_count, error_message)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                item.id.as_str(),
                item.task_id.as_str(),
                item.operation.as_str(),
                data,
                item.created_at,
                item.retry_count,
                item.error_message,
            ],
        )?;
        Ok(())
    }

    fn pending(&self) -> Result<Vec<SyncQueueItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, operation, data, created_at, retry_count, error_message
             FROM sync_queue
             ORDER BY created_at ASC, id ASC",
        )?;

        let items = stmt
            .query_map([], Self::parse_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(items)
    }

    fn remove(&self, id: &QueueItemId) -> Result<()> {
        self.conn.execute(
            "DELETE FROM sync_queue WHERE id = ?",
            params![id.as_str()],
        )?;
        Ok(())
    }

    fn record_failure(&self, id: &QueueItemId, message: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE sync_queue SET retry_count = retry_count + 1, error_message = ?
             WHERE id = ?",
            params![message, id.as_str()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{SyncOperation, TaskData, TaskId};
    use pretty_assertions::assert_eq;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn item_at(created_at: i64) -> SyncQueueItem {
        let mut item = SyncQueueItem::new(TaskId::new(), SyncOperation::Create, TaskData::default());
        item.created_at = created_at;
        item
    }

    #[test]
    fn test_enqueue_and_pending_fifo() {
        let db = setup();
        let store = SqliteSyncQueueStore::new(db.connection());

        let newer = item_at(2_000);
        let older = item_at(1_000);
        store.enqueue(&newer).unwrap();
        store.enqueue(&older).unwrap();

        let pending = store.pending().unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, older.id);
        assert_eq!(pending[1].id, newer.id);
    }

    #[test]
    fn test_remove() {
        let db = setup();
        let store = SqliteSyncQueueStore::new(db.connection());

        let item = item_at(1_000);
        store.enqueue(&item).unwrap();
        store.remove(&item.id).unwrap();

        assert!(store.pending().unwrap().is_empty());
    }

    #[test]
    fn test_record_failure_bumps_retry_count() {
        let db = setup();
        let store = SqliteSyncQueueStore::new(db.connection());

        let item = item_at(1_000);
        store.enqueue(&item).unwrap();

        store.record_failure(&item.id, "boom").unwrap();
        store.record_failure(&item.id, "boom again").unwrap();

        let pending = store.pending().unwrap();
        assert_eq!(pending[0].retry_count, 2);
        assert_eq!(pending[0].error_message.as_deref(), Some("boom again"));
    }

    #[test]
    fn test_data_round_trips_through_storage() {
        let db = setup();
        let store = SqliteSyncQueueStore::new(db.connection());

        let mut item = item_at(1_000);
        item.data = TaskData {
            title: Some("Stored".to_string()),
            completed: Some(true),
            updated_at: Some(1_000),
            ..TaskData::default()
        };
        store.enqueue(&item).unwrap();

        let pending = store.pending().unwrap();
        assert_eq!(pending[0].data, item.data);
    }
}
