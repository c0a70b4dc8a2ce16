//! Fathom API client for looking up processed meeting recordings.
//!
//! Fathom has no endpoint for fetching a single recording, so the client pages
//! through `GET /external/v1/meetings` (summary and action items included) until
//! it finds the meeting whose `recording_id` matches.

use crate::error::Error;
use crate::gateway::RecordingSource;
use crate::recording::{ActionItem, Participant, Recording};
use async_trait::async_trait;
use chrono::DateTime;
use log::*;
use meeting_auth::api_key::{ApiKeyAuth, ApiKeyProvider};
use meeting_auth::http::{AuthenticatedClient, AuthenticatedClientBuilder};
use meeting_auth::Error as MeetingAuthError;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::Value;
use service::config::Config;
use std::collections::HashSet;

const MEETINGS_PATH: &str = "/external/v1/meetings";
const UNTITLED_MEETING: &str = "Untitled Meeting";

/// One page of `GET /external/v1/meetings`.
#[derive(Debug, Deserialize)]
struct MeetingsPage {
    #[serde(default)]
    items: Vec<FathomMeeting>,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// A meeting as listed by Fathom. Every field is optional so that one odd item
/// does not fail the whole page.
#[derive(Debug, Default, Deserialize)]
struct FathomMeeting {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    recording_id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    meeting_title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    share_url: Option<String>,
    #[serde(default)]
    recording_start_time: Option<String>,
    #[serde(default)]
    recording_end_time: Option<String>,
    #[serde(default)]
    scheduled_start_time: Option<String>,
    #[serde(default)]
    scheduled_end_time: Option<String>,
    #[serde(default)]
    calendar_invitees: Option<Vec<Invitee>>,
    #[serde(default)]
    default_summary: Option<Summary>,
    #[serde(default)]
    action_items: Option<Vec<FathomActionItem>>,
    #[serde(default)]
    transcript: Option<Vec<TranscriptLine>>,
}

#[derive(Debug, Default, Deserialize)]
struct Invitee {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Summary {
    #[serde(default)]
    markdown_formatted: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FathomActionItem {
    #[serde(default, alias = "text")]
    description: Option<String>,
    #[serde(default)]
    assignee: Option<Invitee>,
}

#[derive(Debug, Deserialize)]
struct TranscriptLine {
    #[serde(default)]
    speaker: Option<Speaker>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Speaker {
    #[serde(default)]
    display_name: Option<String>,
}

/// Fathom API client
pub struct FathomClient {
    client: AuthenticatedClient,
    base_url: String,
    include_transcript: bool,
    participant_filter: Option<String>,
}

impl FathomClient {
    /// Create a new Fathom client from configuration.
    ///
    /// Fails with a `Config` error when `FATHOM_API_KEY` is not set.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let api_key = config
            .fathom_api_key()
            .ok_or_else(|| Error::config("FATHOM_API_KEY is not set"))?;
        let auth = ApiKeyAuth::new(ApiKeyProvider::Fathom, SecretString::new(api_key))?;

        let client = AuthenticatedClientBuilder::new()
            .with_auth(Box::new(auth))
            .with_connect_timeout(config.http_connect_timeout())
            .with_read_timeout(config.http_read_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.fathom_base_url().trim_end_matches('/').to_string(),
            include_transcript: config.fathom_include_transcript,
            participant_filter: config.fathom_participant_filter(),
        })
    }

    async fn fetch_page(&self, cursor: Option<&str>) -> Result<MeetingsPage, Error> {
        let url = format!("{}{}", self.base_url, MEETINGS_PATH);
        let mut query = vec![
            ("include_action_items", "true".to_string()),
            ("include_summary", "true".to_string()),
            ("include_transcript", self.include_transcript.to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to list Fathom meetings: {:?}", e);
                MeetingAuthError::from(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(MeetingAuthError::from)?;

        if !status.is_success() {
            warn!("Fathom API error {}: {}", status, body);
            return Err(Error::upstream(format!(
                "Fathom API returned {}: {}",
                status, body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to decode Fathom meetings page: {:?}", e);
            debug!("Undecodable Fathom body: {}", body);
            Error::upstream(format!("Invalid response from Fathom API: {e}"))
        })
    }

    fn matches_participant_filter(&self, meeting: &FathomMeeting) -> bool {
        let filter = match &self.participant_filter {
            Some(filter) => filter.to_lowercase(),
            None => return true,
        };

        meeting
            .calendar_invitees
            .iter()
            .flatten()
            .any(|invitee| {
                let contains = |value: &Option<String>| {
                    value
                        .as_deref()
                        .map(|v| v.to_lowercase().contains(&filter))
                        .unwrap_or(false)
                };
                contains(&invitee.name) || contains(&invitee.email)
            })
    }
}

#[async_trait]
impl RecordingSource for FathomClient {
    async fn fetch_recording(&self, recording_id: &str) -> Result<Recording, Error> {
        let mut cursor: Option<String> = None;
        let mut seen_cursors = HashSet::new();
        let mut pages = 0;

        loop {
            let page = self.fetch_page(cursor.as_deref()).await?;
            pages += 1;

            let found = page.items.into_iter().find(|meeting| {
                meeting.recording_id.as_ref().and_then(id_to_string).as_deref()
                    == Some(recording_id)
                    && self.matches_participant_filter(meeting)
            });
            if let Some(meeting) = found {
                debug!("Found Fathom recording {} on page {}", recording_id, pages);
                return Ok(into_recording(recording_id, meeting, self.include_transcript));
            }

            match page.next_cursor.filter(|c| !c.is_empty()) {
                Some(next) if seen_cursors.insert(next.clone()) => cursor = Some(next),
                Some(next) => {
                    warn!("Fathom returned cursor {} twice, stopping pagination", next);
                    break;
                }
                None => break,
            }
        }

        info!(
            "Recording {} not found after scanning {} page(s)",
            recording_id, pages
        );
        Err(Error::not_found(format!(
            "Recording {recording_id} not found in Fathom"
        )))
    }
}

/// String form of an id Fathom may send as a number or a string.
fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn duration_seconds(start: Option<&str>, end: Option<&str>) -> Option<i64> {
    let start = DateTime::parse_from_rfc3339(start?).ok()?;
    let end = DateTime::parse_from_rfc3339(end?).ok()?;
    let seconds = (end - start).num_seconds();
    (seconds >= 0).then_some(seconds)
}

fn into_recording(recording_id: &str, meeting: FathomMeeting, include_transcript: bool) -> Recording {
    let duration_seconds = duration_seconds(
        meeting.recording_start_time.as_deref(),
        meeting.recording_end_time.as_deref(),
    );

    let recording_url = non_empty(meeting.url).or_else(|| non_empty(meeting.share_url.clone()));
    let embed_url = recording_url
        .as_ref()
        .map(|url| url.replace("/share/", "/embed/"));

    let participants = meeting
        .calendar_invitees
        .unwrap_or_default()
        .into_iter()
        .map(|invitee| {
            let name = non_empty(invitee.name)
                .or_else(|| invitee.email.clone())
                .unwrap_or_default();
            Participant::new(&name, invitee.email.as_deref())
        })
        .collect();

    let action_items = meeting
        .action_items
        .unwrap_or_default()
        .into_iter()
        .map(|item| {
            let (name, email) = match item.assignee {
                Some(assignee) => (assignee.name, assignee.email),
                None => (None, None),
            };
            ActionItem::new(
                item.description.as_deref().unwrap_or_default(),
                name.as_deref(),
                email.as_deref(),
            )
        })
        .collect();

    let transcript = if include_transcript {
        meeting.transcript.map(|lines| {
            lines
                .into_iter()
                .filter_map(|line| {
                    let text = line.text?;
                    let speaker = line
                        .speaker
                        .and_then(|s| s.display_name)
                        .unwrap_or_else(|| "Unknown".to_string());
                    Some(format!("{speaker}: {text}"))
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
    } else {
        None
    };

    Recording {
        recording_id: recording_id.to_string(),
        meeting_id: meeting.id.as_ref().and_then(id_to_string),
        title: non_empty(meeting.title)
            .or_else(|| non_empty(meeting.meeting_title))
            .unwrap_or_else(|| UNTITLED_MEETING.to_string()),
        recording_url,
        embed_url,
        share_url: non_empty(meeting.share_url),
        summary: meeting
            .default_summary
            .and_then(|s| s.markdown_formatted)
            .unwrap_or_default(),
        transcript: non_empty(transcript),
        // Not provided by the meetings listing.
        transcript_url: None,
        start_time: non_empty(meeting.recording_start_time)
            .or_else(|| non_empty(meeting.scheduled_start_time)),
        end_time: non_empty(meeting.recording_end_time)
            .or_else(|| non_empty(meeting.scheduled_end_time)),
        duration_seconds,
        participants,
        action_items,
    }
}
