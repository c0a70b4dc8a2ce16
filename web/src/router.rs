use crate::controller::{health_check_controller, webhook_controller};
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI document. To be a part
// of the rendered document, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Fathom Airtable Sync API"
        ),
        paths(
            health_check_controller::health_check,
            webhook_controller::fathom_webhook,
            webhook_controller::last_payload,
        ),
        tags(
            (name = "fathom_airtable_sync", description = "Fathom meeting recordings synced into Airtable")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(webhook_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn webhook_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/webhooks/fathom", post(webhook_controller::fathom_webhook))
        .route("/webhooks/fathom/last", get(webhook_controller::last_payload))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use clap::Parser;
    use domain::error::Error as DomainError;
    use domain::person::PersonIdentity;
    use domain::record::{Fields, PersonSchema, StoreRecord, TableRole};
    use domain::recording::{ActionItem, Participant, Recording};
    use domain::{RecordStore, RecordingSource};
    use serde_json::{json, Value};
    use service::config::Config;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    /// Serves one fixed recording, or `NotFound` for any other id.
    struct FixedSource {
        recording: Recording,
    }

    #[async_trait]
    impl RecordingSource for FixedSource {
        async fn fetch_recording(&self, recording_id: &str) -> Result<Recording, DomainError> {
            if recording_id == self.recording.recording_id {
                Ok(self.recording.clone())
            } else {
                Err(DomainError::not_found(format!(
                    "Recording {recording_id} not found in Fathom"
                )))
            }
        }
    }

    /// Never finds a person and hands out sequential ids.
    #[derive(Default)]
    struct SequentialStore {
        schema: PersonSchema,
        created: Mutex<Vec<StoreRecord>>,
    }

    #[async_trait]
    impl RecordStore for SequentialStore {
        fn person_schema(&self) -> &PersonSchema {
            &self.schema
        }

        async fn find_person(
            &self,
            _identity: &PersonIdentity,
        ) -> Result<Option<StoreRecord>, DomainError> {
            Ok(None)
        }

        async fn create_record(
            &self,
            table: TableRole,
            fields: Fields,
        ) -> Result<StoreRecord, DomainError> {
            let mut created = self.created.lock().unwrap();
            let record = StoreRecord {
                id: format!("rec{}", created.len()),
                table,
                fields,
            };
            created.push(record.clone());
            Ok(record)
        }
    }

    fn app() -> (Router, Arc<SequentialStore>) {
        let recording = Recording {
            recording_id: "123".to_string(),
            title: "Weekly Sync".to_string(),
            participants: vec![Participant::new("Doe, Jane", Some("jane@example.com"))],
            action_items: vec![
                ActionItem::new("Send the deck", Some("Jane Doe"), None),
                ActionItem::new("Book the room", None, None),
            ],
            ..Default::default()
        };
        let store = Arc::new(SequentialStore::default());
        let config = Config::try_parse_from(["fathom_airtable_sync"]).unwrap();
        let app_state = AppState::new(
            service::AppState::new(config),
            Arc::new(FixedSource { recording }),
            store.clone(),
        );
        (define_routes(app_state), store)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check_returns_healthy() {
        let (router, _) = app();
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"healthy");
    }

    #[tokio::test]
    async fn test_webhook_success_returns_sync_summary() {
        let (router, store) = app();
        let response = router
            .oneshot(post_json("/webhooks/fathom", r#"{"recording_id": 123}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Recording synced to Airtable");
        assert_eq!(body["recording_id"], "123");
        assert_eq!(body["meeting_record_id"], "rec1");
        assert_eq!(body["action_items_created"], 2);
        assert_eq!(body["action_items"][0]["status"], "created");
        assert!(body["correlation_id"].as_str().unwrap().len() == 36);

        // One person, one meeting, two action items.
        assert_eq!(store.created.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_webhook_missing_id_is_bad_request() {
        let (router, store) = app();
        let response = router
            .oneshot(post_json("/webhooks/fathom", r#"{"event": "recording.ready"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["stage"], "parse");
        assert_eq!(body["error_kind"], "validation");
        assert!(store.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_invalid_json_is_bad_request() {
        let (router, _) = app();
        let response = router
            .oneshot(post_json("/webhooks/fathom", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["stage"], "parse");
    }

    #[tokio::test]
    async fn test_webhook_unknown_recording_is_not_found() {
        let (router, store) = app();
        let response = router
            .oneshot(post_json("/webhooks/fathom", r#"{"call_id": "999"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["stage"], "fetch_recording");
        assert_eq!(body["error_kind"], "not_found");
        assert!(store.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_rejects_other_methods() {
        let (router, _) = app();
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/webhooks/fathom")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_last_payload_is_recorded() {
        let (router, _) = app();

        let empty = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/webhooks/fathom/last")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(empty.status(), StatusCode::NOT_FOUND);

        router
            .clone()
            .oneshot(post_json("/webhooks/fathom", r#"{"call_id": "999"}"#))
            .await
            .unwrap();

        let last = router
            .oneshot(
                Request::builder()
                    .uri("/webhooks/fathom/last")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(last.status(), StatusCode::OK);
        let body = json_body(last).await;
        assert_eq!(body["body"], json!({"call_id": "999"}));
        assert!(body["received_at"].is_string());
    }
}
