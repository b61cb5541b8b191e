use std::sync::{Arc, Mutex};

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use tasksync_core::db::{Database, SqliteTaskStore};
use tasksync_core::sync::{BatchReconciler, BatchSyncRequest, BatchSyncResponse};

use crate::config::AppConfig;
use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    // One connection guarded by a mutex: batches against the store are fully
    // serialized, so no two batches can interleave a read-compare-write on
    // the same task id.
    db: Arc<Mutex<Database>>,
}

impl AppState {
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self, tasksync_core::Error> {
        let db = Database::open(&config.database_path)?;
        Ok(Self {
            config,
            db: Arc::new(Mutex::new(db)),
        })
    }

    #[cfg(test)]
    fn in_memory() -> Self {
        Self {
            config: Arc::new(AppConfig {
                bind_addr: "127.0.0.1:0".to_string(),
                database_path: ":memory:".into(),
            }),
            db: Arc::new(Mutex::new(Database::open_in_memory().unwrap())),
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/sync/batch", post(batch_sync))
        .route("/sync/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
    })
}

async fn batch_sync(
    State(state): State<AppState>,
    request: Result<Json<BatchSyncRequest>, JsonRejection>,
) -> Result<Json<BatchSyncResponse>, AppError> {
    // A body missing `items` or `client_timestamp` is rejected wholesale,
    // before any reconciliation.
    let Json(request) = request.map_err(|e| AppError::bad_request(e.body_text()))?;

    let db = state
        .db
        .lock()
        .map_err(|_| AppError::internal("database lock poisoned"))?;
    let store = SqliteTaskStore::new(db.connection());
    let reconciler = BatchReconciler::new(&store);
    let response = reconciler.handle_batch_sync(&request)?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use tasksync_core::models::{SyncOperation, SyncQueueItem, TaskData, TaskId};
    use tower::ServiceExt;

    async fn send_json(router: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let router = app_router(AppState::in_memory());
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/sync/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_batch_sync_rejects_missing_fields() {
        let router = app_router(AppState::in_memory());

        let (status, _) = send_json(
            router.clone(),
            "/sync/batch",
            serde_json::json!({ "items": [] }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send_json(
            router,
            "/sync/batch",
            serde_json::json!({ "client_timestamp": "2024-01-01T00:00:00Z" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_batch_sync_empty_batch() {
        let router = app_router(AppState::in_memory());

        let (status, json) = send_json(
            router,
            "/sync/batch",
            serde_json::json!({
                "items": [],
                "client_timestamp": "2024-01-01T00:00:00Z"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["processed_items"], serde_json::json!([]));
        assert_eq!(json["server_changes"], serde_json::json!([]));
        assert!(json["server_timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_batch_sync_create_then_changes_since() {
        let state = AppState::in_memory();
        let router = app_router(state);

        let task_id = TaskId::new();
        let item = SyncQueueItem::new(
            task_id,
            SyncOperation::Create,
            TaskData {
                title: Some("Over the wire".to_string()),
                updated_at: Some(5_000),
                ..TaskData::default()
            },
        );

        let (status, json) = send_json(
            router.clone(),
            "/sync/batch",
            serde_json::json!({
                "items": [&item],
                "client_timestamp": "1970-01-01T00:00:00Z"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["processed_items"][0]["status"], "success");
        assert_eq!(json["processed_items"][0]["client_id"], serde_json::json!(item.id));

        // The accepted write is echoed back in server_changes
        assert_eq!(json["server_changes"][0]["title"], "Over the wire");

        // A later empty sync from the new high-water mark sees nothing
        let (status, json) = send_json(
            router,
            "/sync/batch",
            serde_json::json!({
                "items": [],
                "client_timestamp": "2100-01-01T00:00:00Z"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["server_changes"], serde_json::json!([]));
    }
}
