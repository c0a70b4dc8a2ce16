//! The webhook-triggered sync: fetch one recording and write it, its people and
//! its action items to the record store.
//!
//! A run is one sequential flow through five stages. Any failure is tagged with
//! the stage it happened in and carries the ids the store already holds from
//! this run. Nothing is rolled back.

use crate::error::Error;
use crate::gateway::{RecordStore, RecordingSource};
use crate::person::{resolve_or_create_person, IdentityCache, PersonIdentity};
use crate::record::{
    action_item_fields as ai, meeting_fields as mf, BaseSchema, FieldKind, Fields, TableRole,
    TableSchema,
};
use crate::recording::{ActionItem, Participant, Recording};
use log::*;
use serde::Serialize;
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    Parse,
    FetchRecording,
    ResolvePeople,
    CreateMeeting,
    CreateActionItems,
}

impl SyncStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStage::Parse => "parse",
            SyncStage::FetchRecording => "fetch_recording",
            SyncStage::ResolvePeople => "resolve_people",
            SyncStage::CreateMeeting => "create_meeting",
            SyncStage::CreateActionItems => "create_action_items",
        }
    }
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one action item of the recording.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionItemOutcome {
    Created {
        index: usize,
        record_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        assignee_record_id: Option<String>,
    },
    Skipped {
        index: usize,
        reason: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SyncResult {
    pub recording_id: String,
    pub meeting_record_id: String,
    pub action_items_created: usize,
    pub action_items: Vec<ActionItemOutcome>,
    /// Every Person record linked from this run, found or created, in first-seen order.
    pub person_record_ids: Vec<String>,
}

/// Records the store already holds from a run that failed part way.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Committed {
    pub person_record_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_record_id: Option<String>,
    pub action_item_record_ids: Vec<String>,
}

#[derive(Debug)]
pub struct SyncError {
    pub stage: SyncStage,
    pub error: Error,
    pub committed: Committed,
}

impl SyncError {
    pub fn new(stage: SyncStage, error: Error) -> Self {
        Self {
            stage,
            error,
            committed: Committed::default(),
        }
    }

    fn with_committed(mut self, committed: Committed) -> Self {
        self.committed = committed;
        self
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "sync failed at stage {}: {}", self.stage, self.error)
    }
}

impl StdError for SyncError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.error)
    }
}

/// Extracts the recording id from a webhook payload.
///
/// `recording_id` wins over `call_id`; either may be a string or an integer.
pub fn parse_recording_id(payload: &Value) -> Result<String, Error> {
    let object = payload
        .as_object()
        .ok_or_else(|| Error::validation("Webhook payload must be a JSON object"))?;

    ["recording_id", "call_id"]
        .iter()
        .find_map(|key| match object.get(*key) {
            Some(Value::String(id)) if !id.trim().is_empty() => Some(id.trim().to_string()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        })
        .ok_or_else(|| Error::validation("No recording_id or call_id in webhook payload"))
}

/// A Person row linked by this run, with the name it was resolved from.
#[derive(Clone, Debug, PartialEq)]
pub struct PersonLink {
    pub record_id: String,
    pub name: String,
}

/// Value written to a column that refers to people. Link columns get record ids;
/// other columns get the names, since the ids mean nothing there.
fn people_value(kind: FieldKind, people: &[&PersonLink]) -> Value {
    match kind {
        FieldKind::Link => Value::from(
            people
                .iter()
                .map(|p| p.record_id.clone())
                .collect::<Vec<_>>(),
        ),
        FieldKind::MultiSelect => {
            Value::from(people.iter().map(|p| p.name.clone()).collect::<Vec<_>>())
        }
        FieldKind::Value => Value::String(
            people
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ),
    }
}

/// Kind of `field` in a described table. `None` when the table has no such column.
/// An undescribed table is assumed to link people.
fn column_kind(
    schema: Option<&TableSchema>,
    field: &str,
    assumed: FieldKind,
) -> Option<FieldKind> {
    match schema {
        Some(schema) => schema.kind(field),
        None => Some(assumed),
    }
}

/// Fields of the Meeting row. Only fields with a value are included.
///
/// With a described table, columns it lacks are left out, as are link columns for
/// values that are not record ids.
pub fn meeting_fields(
    recording: &Recording,
    participants: &[PersonLink],
    schema: Option<&TableSchema>,
) -> Fields {
    let mut fields = Fields::new();
    let mut put = |name: &str, value: Option<Value>| {
        let writable = matches!(
            column_kind(schema, name, FieldKind::Value),
            Some(FieldKind::Value | FieldKind::MultiSelect)
        );
        match value {
            Some(value) if writable => {
                fields.insert(name.to_string(), value);
            }
            Some(_) => debug!("Leaving out meeting field {}", name),
            None => {}
        }
    };
    let text = |value: &Option<String>| value.clone().map(Value::String);

    put(mf::TITLE, Some(Value::String(recording.title.clone())));
    put(mf::RECORDING_URL, text(&recording.recording_url));
    put(mf::EMBED_URL, text(&recording.embed_url));
    put(
        mf::SUMMARY,
        Some(recording.summary.clone())
            .filter(|s| !s.trim().is_empty())
            .map(Value::String),
    );
    put(mf::START_TIME, text(&recording.start_time));
    put(mf::DURATION, recording.duration_seconds.map(Value::from));
    put(mf::CALL_ID, Some(Value::String(recording.recording_id.clone())));
    put(mf::TRANSCRIPT_URL, text(&recording.transcript_url));
    put(mf::TRANSCRIPT, text(&recording.transcript));

    if !participants.is_empty() {
        if let Some(kind) = column_kind(schema, mf::PARTICIPANTS, FieldKind::Link) {
            let people: Vec<&PersonLink> = participants.iter().collect();
            fields.insert(mf::PARTICIPANTS.to_string(), people_value(kind, &people));
        }
    }

    fields
}

/// Fields of one ActionItem row linked to its meeting and, when known, its assignee.
pub fn action_item_fields(
    item: &ActionItem,
    meeting_record_id: &str,
    assignee: Option<&PersonLink>,
    schema: Option<&TableSchema>,
) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        ai::DESCRIPTION.to_string(),
        Value::String(item.description.clone()),
    );
    fields.insert(
        ai::STATUS.to_string(),
        Value::String(ai::STATUS_TODO.to_string()),
    );
    fields.insert(
        ai::MEETING.to_string(),
        Value::from(vec![meeting_record_id.to_string()]),
    );
    if let Some(assignee) = assignee {
        match column_kind(schema, ai::ASSIGNED_TO, FieldKind::Link) {
            Some(kind) => {
                fields.insert(ai::ASSIGNED_TO.to_string(), people_value(kind, &[assignee]));
            }
            None => debug!("Action items table has no {} column", ai::ASSIGNED_TO),
        }
    }
    fields
}

fn stage_done(recording_id: &str, stage: SyncStage, started: Instant) {
    info!(
        "[{}] Stage {} completed in {} ms",
        recording_id,
        stage,
        started.elapsed().as_millis()
    );
}

fn push_unique(links: &mut Vec<PersonLink>, link: &PersonLink) {
    if !links.iter().any(|existing| existing.record_id == link.record_id) {
        links.push(link.clone());
    }
}

fn committed_people(cache: &IdentityCache) -> Committed {
    Committed {
        person_record_ids: cache.created_ids().to_vec(),
        ..Default::default()
    }
}

/// People linked by this run and the assignee of each action item.
struct ResolvedPeople {
    linked: Vec<PersonLink>,
    assignees: Vec<Option<PersonLink>>,
}

fn link_to(record_id: String, identity: &PersonIdentity) -> PersonLink {
    PersonLink {
        record_id,
        name: identity.name().to_string(),
    }
}

/// Reads the store's table layouts. A store that cannot describe them is not fatal:
/// the run goes on sending record links, as it would without a schema.
async fn read_tables(store: &dyn RecordStore, recording_id: &str) -> BaseSchema {
    let tables = match store.describe_tables().await {
        Ok(tables) => tables,
        Err(e) => {
            warn!(
                "[{}] Could not read table layouts, writing record links: {}",
                recording_id,
                e.message()
            );
            return BaseSchema::default();
        }
    };

    let name_field = &store.person_schema().name_field;
    if let Some(people) = tables.table(TableRole::Person) {
        if !people.has_field(name_field) {
            warn!(
                "[{}] People table has no \"{}\" column; person lookups will not match",
                recording_id, name_field
            );
        }
    }
    tables
}

async fn resolve_people(
    store: &dyn RecordStore,
    cache: &mut IdentityCache,
    recording: &Recording,
) -> Result<ResolvedPeople, Error> {
    let mut linked = Vec::new();

    for participant in &recording.participants {
        let Some(identity) = participant.identity() else {
            debug!("Skipping participant without name or email");
            continue;
        };
        let record = resolve_or_create_person(store, cache, &identity).await?;
        push_unique(&mut linked, &link_to(record.id, &identity));
    }

    let mut assignees = Vec::with_capacity(recording.action_items.len());
    for item in &recording.action_items {
        // Items without a description are never written, so their assignees are not linked.
        if item.description.is_empty() {
            assignees.push(None);
            continue;
        }
        let assignee = match item.assignee.as_ref().and_then(Participant::identity) {
            Some(identity) => {
                let record = resolve_or_create_person(store, cache, &identity).await?;
                let link = link_to(record.id, &identity);
                push_unique(&mut linked, &link);
                Some(link)
            }
            None => None,
        };
        assignees.push(assignee);
    }

    Ok(ResolvedPeople { linked, assignees })
}

/// Runs one sync for a webhook payload.
pub async fn handle_webhook(
    source: &dyn RecordingSource,
    store: &dyn RecordStore,
    payload: &Value,
) -> Result<SyncResult, SyncError> {
    let run_started = Instant::now();

    let started = Instant::now();
    let recording_id =
        parse_recording_id(payload).map_err(|e| SyncError::new(SyncStage::Parse, e))?;
    stage_done(&recording_id, SyncStage::Parse, started);

    let started = Instant::now();
    let recording = source
        .fetch_recording(&recording_id)
        .await
        .map_err(|e| SyncError::new(SyncStage::FetchRecording, e))?;
    info!(
        "[{}] Fetched \"{}\" with {} participant(s) and {} action item(s)",
        recording_id,
        recording.title,
        recording.participants.len(),
        recording.action_items.len()
    );
    stage_done(&recording_id, SyncStage::FetchRecording, started);

    let started = Instant::now();
    let tables = read_tables(store, &recording_id).await;
    let mut cache = IdentityCache::new();
    let people = match resolve_people(store, &mut cache, &recording).await {
        Ok(people) => people,
        Err(e) => {
            return Err(SyncError::new(SyncStage::ResolvePeople, e)
                .with_committed(committed_people(&cache)))
        }
    };
    stage_done(&recording_id, SyncStage::ResolvePeople, started);

    let started = Instant::now();
    let meeting = store
        .create_record(
            TableRole::Meeting,
            meeting_fields(&recording, &people.linked, tables.table(TableRole::Meeting)),
        )
        .await
        .map_err(|e| {
            SyncError::new(SyncStage::CreateMeeting, e).with_committed(committed_people(&cache))
        })?;
    info!("[{}] Created meeting record {}", recording_id, meeting.id);
    stage_done(&recording_id, SyncStage::CreateMeeting, started);

    let started = Instant::now();
    let mut committed = committed_people(&cache);
    committed.meeting_record_id = Some(meeting.id.clone());
    let mut outcomes = Vec::with_capacity(recording.action_items.len());

    for (index, item) in recording.action_items.iter().enumerate() {
        if item.description.is_empty() {
            warn!("[{}] Skipping action item {}: empty description", recording_id, index);
            outcomes.push(ActionItemOutcome::Skipped {
                index,
                reason: "empty description".to_string(),
            });
            continue;
        }

        let assignee = people.assignees.get(index).and_then(Option::as_ref);
        let fields = action_item_fields(
            item,
            &meeting.id,
            assignee,
            tables.table(TableRole::ActionItem),
        );
        let assignee_record_id = assignee.map(|link| link.record_id.clone());

        match store.create_record(TableRole::ActionItem, fields).await {
            Ok(record) => {
                info!(
                    "[{}] Created action item {} as {}",
                    recording_id, index, record.id
                );
                committed.action_item_record_ids.push(record.id.clone());
                outcomes.push(ActionItemOutcome::Created {
                    index,
                    record_id: record.id,
                    assignee_record_id,
                });
            }
            Err(e) if e.is_validation() => {
                warn!(
                    "[{}] Skipping action item {}: {}",
                    recording_id,
                    index,
                    e.message()
                );
                outcomes.push(ActionItemOutcome::Skipped {
                    index,
                    reason: e.message(),
                });
            }
            Err(e) => {
                return Err(
                    SyncError::new(SyncStage::CreateActionItems, e).with_committed(committed)
                )
            }
        }
    }
    stage_done(&recording_id, SyncStage::CreateActionItems, started);

    let action_items_created = committed.action_item_record_ids.len();
    info!(
        "[{}] Sync finished in {} ms: meeting {}, {} action item(s) created",
        recording_id,
        run_started.elapsed().as_millis(),
        meeting.id,
        action_items_created
    );

    Ok(SyncResult {
        recording_id,
        meeting_record_id: meeting.id,
        action_items_created,
        action_items: outcomes,
        person_record_ids: people
            .linked
            .into_iter()
            .map(|link| link.record_id)
            .collect(),
    })
}
