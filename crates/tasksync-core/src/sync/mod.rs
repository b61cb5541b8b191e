//! Batch synchronization engine
//!
//! The client side drains the sync queue into one batch request
//! ([`orchestrator::SyncOrchestrator`]); the server side resolves each item
//! against the task store with last-write-wins and computes the outbound
//! changes ([`reconciler::BatchReconciler`]). [`protocol`] holds the shared
//! wire types, [`transport`] the HTTP client.

pub mod orchestrator;
pub mod protocol;
pub mod reconciler;
pub mod transport;

pub use orchestrator::{SyncOrchestrator, SyncReport};
pub use protocol::{BatchSyncRequest, BatchSyncResponse, ItemStatus, ProcessedItem};
pub use reconciler::BatchReconciler;
pub use transport::{HttpSyncTransport, SyncTransport, TransportError};
