use chrono::{DateTime, Utc};
use config::Config;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod config;
pub mod logging;

/// The most recent webhook body received by this process, kept in memory for debugging.
#[derive(Clone, Debug, Serialize)]
pub struct ReceivedPayload {
    pub correlation_id: String,
    pub received_at: DateTime<Utc>,
    pub body: serde_json::Value,
}

/// Holds the last received webhook payload. Owned by `AppState` and injected into
/// handlers rather than living in a global.
#[derive(Clone, Default)]
pub struct PayloadSnapshot {
    last: Arc<RwLock<Option<ReceivedPayload>>>,
}

impl PayloadSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, correlation_id: &str, body: serde_json::Value) {
        let mut last = self.last.write().await;
        *last = Some(ReceivedPayload {
            correlation_id: correlation_id.to_string(),
            received_at: Utc::now(),
            body,
        });
    }

    pub async fn latest(&self) -> Option<ReceivedPayload> {
        self.last.read().await.clone()
    }
}

// Service-level state containing only infrastructure concerns
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub payload_snapshot: PayloadSnapshot,
}

impl AppState {
    pub fn new(app_config: Config) -> Self {
        Self {
            config: app_config,
            payload_snapshot: PayloadSnapshot::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_payload_snapshot_starts_empty() {
        let snapshot = PayloadSnapshot::new();
        assert!(snapshot.latest().await.is_none());
    }

    #[tokio::test]
    async fn test_payload_snapshot_keeps_only_latest_body() {
        let snapshot = PayloadSnapshot::new();
        snapshot.record("first", json!({"recording_id": 1})).await;
        snapshot.record("second", json!({"recording_id": 2})).await;

        let latest = snapshot.latest().await.unwrap();
        assert_eq!(latest.correlation_id, "second");
        assert_eq!(latest.body, json!({"recording_id": 2}));
    }

    #[tokio::test]
    async fn test_payload_snapshot_clones_share_state() {
        let snapshot = PayloadSnapshot::new();
        let handle = snapshot.clone();
        handle.record("abc", json!({"call_id": "42"})).await;

        assert_eq!(snapshot.latest().await.unwrap().correlation_id, "abc");
    }
}
