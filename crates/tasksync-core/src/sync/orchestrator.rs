//! Client-side sync orchestrator
//!
//! Drains the sync queue into one batch request, interprets the per-item
//! verdicts, prunes or retains queue entries, and folds the server's
//! outbound changes into the local store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use crate::db::{SyncMetaStore, SyncQueueStore, TaskStore};
use crate::error::Result;
use crate::models::{SyncStatus, Task, TaskId};
use crate::sync::protocol::{BatchSyncRequest, ItemStatus};
use crate::sync::transport::SyncTransport;

/// Outcome of one `sync()` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// True when no item ended in an `error` verdict
    pub success: bool,
    /// Items terminally resolved (accepted or conflict-resolved)
    pub synced_items: usize,
    /// Items left queued for retry
    pub failed_items: usize,
    /// True when the call was skipped because a sync was already in flight
    pub skipped: bool,
    /// Transport failure message, when the whole batch failed
    pub message: Option<String>,
}

impl SyncReport {
    const fn empty() -> Self {
        Self {
            success: true,
            synced_items: 0,
            failed_items: 0,
            skipped: false,
            message: None,
        }
    }

    const fn skipped() -> Self {
        Self {
            success: true,
            synced_items: 0,
            failed_items: 0,
            skipped: true,
            message: None,
        }
    }
}

/// Drains the local sync queue against a server
pub struct SyncOrchestrator<T: SyncTransport> {
    transport: T,
    in_flight: AtomicBool,
}

/// Releases the in-flight flag on every exit path
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: SyncTransport> SyncOrchestrator<T> {
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Probe server connectivity without touching any local state
    pub async fn check_connection(&self) -> bool {
        self.transport.health_check().await
    }

    /// Drain the pending queue as one batch and reconcile the response
    ///
    /// At most one call runs at a time; a call made while another is in
    /// flight returns a skipped report without reading the queue. On
    /// transport failure the entire batch is reported failed and the queue
    /// is left untouched for the next attempt.
    pub async fn sync(
        &self,
        tasks: &impl TaskStore,
        queue: &impl SyncQueueStore,
        meta: &impl SyncMetaStore,
    ) -> Result<SyncReport> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Sync already in flight, skipping");
            return Ok(SyncReport::skipped());
        }
        let _guard = InFlightGuard(&self.in_flight);

        let pending = queue.pending()?;
        if pending.is_empty() {
            return Ok(SyncReport::empty());
        }

        let client_timestamp = meta
            .last_sync_timestamp()?
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or(DateTime::UNIX_EPOCH);

        let request = BatchSyncRequest {
            items: pending.clone(),
            client_timestamp,
        };
        tracing::info!(items = pending.len(), "Sending sync batch");

        let response = match self.transport.send_batch(&request).await {
            Ok(response) => response,
            Err(e) => {
                // No response received: the whole batch stays queued.
                tracing::warn!(error = %e, "Sync transport failed, batch left queued");
                return Ok(SyncReport {
                    success: false,
                    synced_items: 0,
                    failed_items: pending.len(),
                    skipped: false,
                    message: Some(e.to_string()),
                });
            }
        };

        let by_client_id: HashMap<_, _> = pending.iter().map(|item| (item.id, item)).collect();
        let mut synced_items = 0;
        let mut failed_items = 0;

        for verdict in &response.processed_items {
            let Some(item) = by_client_id.get(&verdict.client_id) else {
                tracing::warn!(client_id = %verdict.client_id, "Verdict for unknown queue item");
                continue;
            };

            match verdict.status {
                ItemStatus::Success => {
                    queue.remove(&verdict.client_id)?;
                    mark_synced(tasks, item.task_id, &verdict.server_id)?;
                    synced_items += 1;
                }
                ItemStatus::Conflict => {
                    // Server override: terminally resolved, adopt its copy.
                    queue.remove(&verdict.client_id)?;
                    if let Some(server_copy) = &verdict.resolved_data {
                        tasks.save(server_copy)?;
                    }
                    synced_items += 1;
                }
                ItemStatus::Error => {
                    let message = verdict.error.as_deref().unwrap_or("unknown server error");
                    queue.record_failure(&verdict.client_id, message)?;
                    mark_errored(tasks, item.task_id)?;
                    failed_items += 1;
                }
            }
        }

        for change in &response.server_changes {
            adopt_server_change(tasks, change)?;
        }

        meta.set_last_sync_timestamp(response.server_timestamp.timestamp_millis())?;

        tracing::info!(synced_items, failed_items, "Sync batch reconciled");
        Ok(SyncReport {
            success: failed_items == 0,
            synced_items,
            failed_items,
            skipped: false,
            message: None,
        })
    }
}

fn mark_synced(tasks: &impl TaskStore, task_id: TaskId, server_id: &str) -> Result<()> {
    if let Some(mut task) = tasks.find_by_id(&task_id)? {
        task.sync_status = SyncStatus::Synced;
        task.server_id = Some(server_id.to_string());
        task.last_synced_at = Some(Utc::now().timestamp_millis());
        tasks.save(&task)?;
    }
    Ok(())
}

fn mark_errored(tasks: &impl TaskStore, task_id: TaskId) -> Result<()> {
    if let Some(mut task) = tasks.find_by_id(&task_id)? {
        task.sync_status = SyncStatus::Error;
        tasks.save(&task)?;
    }
    Ok(())
}

/// Adopt a server-side change unless the local copy is strictly newer
/// (a newer local copy is still queued and will win on the next sync).
fn adopt_server_change(tasks: &impl TaskStore, change: &Task) -> Result<()> {
    if let Some(local) = tasks.find_by_id(&change.id)? {
        if local.updated_at > change.updated_at {
            tracing::debug!(task_id = %change.id, "Keeping newer local copy");
            return Ok(());
        }
    }
    tasks.save(change)
}
