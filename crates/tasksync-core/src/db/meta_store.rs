//! Client sync bookkeeping store

use crate::error::Result;
use rusqlite::{params, Connection};

const LAST_SYNC_KEY: &str = "last_sync_timestamp";

/// Trait for client-side sync bookkeeping
///
/// Holds the high-water mark: the server timestamp up to which this client
/// has already received server changes.
pub trait SyncMetaStore {
    /// The stored high-water mark (Unix ms), if any sync has succeeded
    fn last_sync_timestamp(&self) -> Result<Option<i64>>;

    /// Store a new high-water mark
    fn set_last_sync_timestamp(&self, timestamp: i64) -> Result<()>;
}

/// `SQLite` implementation of `SyncMetaStore`
pub struct SqliteSyncMetaStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSyncMetaStore<'a> {
    /// Create a new store with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SyncMetaStore for SqliteSyncMetaStore<'_> {
    fn last_sync_timestamp(&self) -> Result<Option<i64>> {
        let result = self.conn.query_row(
            "SELECT value FROM sync_meta WHERE key = ?",
            params![LAST_SYNC_KEY],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(value.parse().ok()),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_last_sync_timestamp(&self, timestamp: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO sync_meta (key, value) VALUES (?, ?)",
            params![LAST_SYNC_KEY, timestamp.to_string()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_until_first_sync() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteSyncMetaStore::new(db.connection());

        assert_eq!(store.last_sync_timestamp().unwrap(), None);
    }

    #[test]
    fn test_set_and_get() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteSyncMetaStore::new(db.connection());

        store.set_last_sync_timestamp(1_234).unwrap();
        assert_eq!(store.last_sync_timestamp().unwrap(), Some(1_234));

        store.set_last_sync_timestamp(5_678).unwrap();
        assert_eq!(store.last_sync_timestamp().unwrap(), Some(5_678));
    }
}
