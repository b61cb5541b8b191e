use std::env;
use std::path::Path;

use tasksync_core::db::{
    SqliteSyncMetaStore, SqliteSyncQueueStore, SqliteTaskStore, SyncMetaStore, SyncQueueStore,
    TaskStore,
};
use tasksync_core::sync::{HttpSyncTransport, SyncOrchestrator};

use crate::commands::common::{format_timestamp, open_database};
use crate::error::CliError;

fn resolve_server_url(flag: Option<String>) -> Result<String, CliError> {
    flag.or_else(|| env::var("TASKSYNC_SERVER_URL").ok())
        .filter(|url| !url.trim().is_empty())
        .ok_or(CliError::ServerNotConfigured)
}

pub async fn run_sync(server: Option<String>, db_path: &Path) -> Result<(), CliError> {
    let server_url = resolve_server_url(server)?;
    let transport = HttpSyncTransport::new(server_url)?;
    let orchestrator = SyncOrchestrator::new(transport);

    // Probe before draining the queue; a dead server must not mutate it.
    if !orchestrator.check_connection().await {
        return Err(CliError::Offline);
    }

    let db = open_database(db_path)?;
    let tasks = SqliteTaskStore::new(db.connection());
    let queue = SqliteSyncQueueStore::new(db.connection());
    let meta = SqliteSyncMetaStore::new(db.connection());

    let report = orchestrator.sync(&tasks, &queue, &meta).await?;

    if report.skipped {
        println!("Sync already in progress, skipped");
    } else if report.success {
        println!("Sync completed: {} item(s) synced", report.synced_items);
    } else {
        let detail = report
            .message
            .unwrap_or_else(|| "some items were rejected".to_string());
        println!(
            "Sync incomplete: {} synced, {} still queued ({detail})",
            report.synced_items, report.failed_items
        );
    }
    Ok(())
}

pub fn run_sync_status(db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let tasks = SqliteTaskStore::new(db.connection());
    let queue = SqliteSyncQueueStore::new(db.connection());
    let meta = SqliteSyncMetaStore::new(db.connection());

    let pending = queue.pending()?;
    println!("Pending items: {}", pending.len());
    for item in &pending {
        let retries = if item.retry_count > 0 {
            format!(" (retries: {})", item.retry_count)
        } else {
            String::new()
        };
        println!("  {} {}{retries}", item.operation.as_str(), item.task_id);
    }

    let needing_sync = tasks.find_needing_sync()?;
    println!("Tasks awaiting server confirmation: {}", needing_sync.len());

    match meta.last_sync_timestamp()? {
        Some(ts) => println!("Last sync: {}", format_timestamp(ts)),
        None => println!("Last sync: never"),
    }
    Ok(())
}
