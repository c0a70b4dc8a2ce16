//! Controller for the Fathom "recording ready" webhook.

use crate::{AppState, Error};

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use domain::error::Error as DomainError;
use domain::{handle_webhook, ActionItemOutcome, SyncError, SyncResult, SyncStage};
use log::*;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

/// Response for a webhook whose recording was synced.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub recording_id: String,
    pub meeting_record_id: String,
    pub action_items_created: usize,
    pub action_items: Vec<ActionItemOutcome>,
    pub person_record_ids: Vec<String>,
    pub correlation_id: String,
}

impl WebhookResponse {
    fn synced(result: SyncResult, correlation_id: String) -> Self {
        Self {
            status: "success",
            message: "Recording synced to Airtable",
            recording_id: result.recording_id,
            meeting_record_id: result.meeting_record_id,
            action_items_created: result.action_items_created,
            action_items: result.action_items,
            person_record_ids: result.person_record_ids,
            correlation_id,
        }
    }
}

/// POST /webhooks/fathom
///
/// Fetches the recording named in the payload from Fathom and writes the meeting, its
/// people and its action items to Airtable. The call returns once the sync has finished.
#[utoipa::path(
    post,
    path = "/webhooks/fathom",
    responses(
        (status = 200, description = "Recording synced to Airtable"),
        (status = 400, description = "Body is not JSON, has no recording id, or a record was rejected"),
        (status = 404, description = "Recording not found in Fathom"),
        (status = 502, description = "Fathom or Airtable returned an error"),
        (status = 504, description = "Fathom or Airtable timed out"),
    )
)]
pub async fn fathom_webhook(
    State(app_state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let correlation_id = Uuid::new_v4().to_string();

    let Json(payload) = payload.map_err(|rejection| {
        Error::new(
            &correlation_id,
            SyncError::new(
                SyncStage::Parse,
                DomainError::validation(format!(
                    "Webhook body is not valid JSON: {}",
                    rejection.body_text()
                )),
            ),
        )
    })?;

    info!("[{}] Received Fathom webhook", correlation_id);
    debug!("[{}] Payload: {}", correlation_id, payload);
    app_state
        .payload_snapshot()
        .record(&correlation_id, payload.clone())
        .await;

    let result = handle_webhook(
        app_state.recording_source.as_ref(),
        app_state.record_store.as_ref(),
        &payload,
    )
    .await
    .map_err(|e| Error::new(&correlation_id, e))?;

    Ok((
        StatusCode::OK,
        Json(WebhookResponse::synced(result, correlation_id)),
    ))
}

/// GET /webhooks/fathom/last
///
/// The most recent webhook body this process received, with its receive time.
#[utoipa::path(
    get,
    path = "/webhooks/fathom/last",
    responses(
        (status = 200, description = "Last received webhook payload"),
        (status = 404, description = "No webhook received since start-up"),
    )
)]
pub async fn last_payload(State(app_state): State<AppState>) -> impl IntoResponse {
    match app_state.payload_snapshot().latest().await {
        Some(received) => (StatusCode::OK, Json(json!(received))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "status": "error",
                "message": "No webhook payload received yet",
            })),
        )
            .into_response(),
    }
}
