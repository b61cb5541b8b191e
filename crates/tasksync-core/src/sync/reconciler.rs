//! Server-side batch reconciler
//!
//! Applies one batch of client mutations against the task store using
//! last-write-wins, producing a verdict per item plus the set of server-side
//! changes the client has not yet seen.

use chrono::Utc;

use crate::db::TaskStore;
use crate::error::Result;
use crate::models::{SyncOperation, SyncQueueItem, SyncStatus, Task};
use crate::sync::protocol::{BatchSyncRequest, BatchSyncResponse, ItemStatus, ProcessedItem};

/// Title given to a created task whose payload carries none
const DEFAULT_TITLE: &str = "Untitled task";

/// Resolves incoming batches against the authoritative task store
pub struct BatchReconciler<'a, S: TaskStore> {
    store: &'a S,
}

impl<'a, S: TaskStore> BatchReconciler<'a, S> {
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Process one batch: items strictly in input order, one verdict each,
    /// then compute the outbound changes.
    ///
    /// A failure while processing one item becomes an `error` verdict for
    /// that item only; siblings are unaffected. The store is re-read for
    /// every item, so a later item observes writes made by an earlier item
    /// of the same batch.
    pub fn handle_batch_sync(&self, request: &BatchSyncRequest) -> Result<BatchSyncResponse> {
        let mut processed_items = Vec::with_capacity(request.items.len());

        for item in &request.items {
            let verdict = match self.process_item(item) {
                Ok(verdict) => verdict,
                Err(e) => {
                    tracing::warn!(item_id = %item.id, task_id = %item.task_id, error = %e,
                        "Failed to process sync item");
                    ProcessedItem {
                        client_id: item.id,
                        server_id: item.task_id.as_str(),
                        status: ItemStatus::Error,
                        resolved_data: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            processed_items.push(verdict);
        }

        let client_ts = request.client_timestamp.timestamp_millis();
        // Intentionally includes rows just written above: the client sees its
        // own accepted writes echoed back in their authoritative stored form.
        let server_changes = self.store.modified_since(client_ts)?;

        let conflicts = processed_items
            .iter()
            .filter(|p| p.status == ItemStatus::Conflict)
            .count();
        let errors = processed_items
            .iter()
            .filter(|p| p.status == ItemStatus::Error)
            .count();
        tracing::info!(
            items = request.items.len(),
            conflicts,
            errors,
            changes = server_changes.len(),
            "Processed sync batch"
        );

        Ok(BatchSyncResponse {
            processed_items,
            server_changes,
            server_timestamp: Utc::now(),
        })
    }

    /// Resolve a single item. Pure in the incoming item and the current
    /// store row: no dependence on sibling items or processing order.
    fn process_item(&self, item: &SyncQueueItem) -> Result<ProcessedItem> {
        let existing = self.store.find_by_id(&item.task_id)?;

        let Some(existing) = existing else {
            return self.reconcile_absent(item);
        };

        // A replayed create against an existing task is treated like an
        // update: it goes through the same last-write-wins comparison.
        let incoming_ts = item.data.updated_at.unwrap_or(existing.updated_at);

        if incoming_ts >= existing.updated_at {
            // Incoming wins; the tie deliberately favors the client change.
            let mut merged = existing;
            item.data.apply_to(&mut merged);
            merged.updated_at = incoming_ts;
            merged.sync_status = SyncStatus::Synced;
            merged.server_id = Some(merged.id.as_str());
            merged.last_synced_at = Some(Utc::now().timestamp_millis());
            self.store.save(&merged)?;

            Ok(ProcessedItem {
                client_id: item.id,
                server_id: merged.id.as_str(),
                status: ItemStatus::Success,
                resolved_data: None,
                error: None,
            })
        } else {
            tracing::debug!(task_id = %item.task_id, incoming_ts, existing_ts = existing.updated_at,
                "Server copy wins last-write-wins");
            Ok(ProcessedItem {
                client_id: item.id,
                server_id: existing.id.as_str(),
                status: ItemStatus::Conflict,
                resolved_data: Some(existing),
                error: None,
            })
        }
    }

    /// The task id is unknown to the store.
    ///
    /// Policy (deliberate, tests assert on it): a create materializes the
    /// task; an update or delete is accepted idempotently without creating
    /// one — the absent end state already matches a delete's intent, and an
    /// update has no target to mutate. Neither case is an error.
    fn reconcile_absent(&self, item: &SyncQueueItem) -> Result<ProcessedItem> {
        if item.operation == SyncOperation::Create {
            let task = materialize(item);
            self.store.save(&task)?;
            tracing::debug!(task_id = %task.id, "Created task from sync item");
        }

        Ok(ProcessedItem {
            client_id: item.id,
            server_id: item.task_id.as_str(),
            status: ItemStatus::Success,
            resolved_data: None,
            error: None,
        })
    }
}

/// Build a new task from a create item, defaulting absent fields
fn materialize(item: &SyncQueueItem) -> Task {
    let now = Utc::now().timestamp_millis();
    let data = &item.data;
    Task {
        id: item.task_id,
        title: data
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        description: data.description.clone(),
        completed: data.completed.unwrap_or(false),
        is_deleted: data.is_deleted.unwrap_or(false),
        created_at: data.created_at.unwrap_or(now),
        updated_at: data.updated_at.unwrap_or(now),
        sync_status: SyncStatus::Synced,
        server_id: Some(item.task_id.as_str()),
        last_synced_at: Some(now),
    }
}
