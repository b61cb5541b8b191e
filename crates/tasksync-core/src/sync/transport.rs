//! HTTP transport for the sync protocol

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::sync::protocol::{BatchSyncRequest, BatchSyncResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid sync endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Sync HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Sync API error: {0}")]
    Api(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Transport seam between the orchestrator and the server
///
/// Any failure returned from `send_batch` means "no response": the caller
/// must treat the whole batch as untransmitted.
#[allow(async_fn_in_trait)]
pub trait SyncTransport {
    /// Transmit one batch and return the server's verdicts
    async fn send_batch(&self, request: &BatchSyncRequest) -> TransportResult<BatchSyncResponse>;

    /// Lightweight connectivity probe; must not mutate anything
    async fn health_check(&self) -> bool;
}

/// `reqwest`-backed transport for the `/sync/batch` and `/sync/health`
/// endpoints
#[derive(Clone)]
pub struct HttpSyncTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSyncTransport {
    pub fn new(base_url: impl Into<String>) -> TransportResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { base_url, client })
    }
}

impl SyncTransport for HttpSyncTransport {
    async fn send_batch(&self, request: &BatchSyncRequest) -> TransportResult<BatchSyncResponse> {
        let response = self
            .client
            .post(format!("{}/sync/batch", self.base_url))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Api(parse_api_error(status, &body)));
        }

        Ok(response.json::<BatchSyncResponse>().await?)
    }

    async fn health_check(&self) -> bool {
        let result = self
            .client
            .get(format!("{}/sync/health", self.base_url))
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "Sync health check failed");
                false
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_base_url(raw: String) -> TransportResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TransportError::InvalidEndpoint(
            "base URL must not be empty".to_string(),
        ));
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.trim_end_matches('/').to_string())
    } else {
        Err(TransportError::InvalidEndpoint(
            "base URL must include http:// or https://".to_string(),
        ))
    }
}
