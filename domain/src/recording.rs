//! A processed meeting recording as fetched from the meetings API.

use crate::person::PersonIdentity;
use crate::text::{extract_assignee, reformat_name};
use serde::Serialize;

/// One meeting capture and everything synced from it.
///
/// Built once by a `RecordingSource` and only ever handed out by shared
/// reference afterwards.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Recording {
    pub recording_id: String,
    pub meeting_id: Option<String>,
    pub title: String,
    pub recording_url: Option<String>,
    pub embed_url: Option<String>,
    pub share_url: Option<String>,
    pub summary: String,
    pub transcript: Option<String>,
    pub transcript_url: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration_seconds: Option<i64>,
    pub participants: Vec<Participant>,
    pub action_items: Vec<ActionItem>,
}

/// A person attending the meeting, or named as an action item's assignee.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Participant {
    /// Name exactly as received.
    pub raw_name: String,
    /// Name in "First Last" form.
    pub name: String,
    pub email: Option<String>,
}

impl Participant {
    pub fn new(raw_name: &str, email: Option<&str>) -> Self {
        let email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        Self {
            raw_name: raw_name.to_string(),
            name: reformat_name(raw_name),
            email,
        }
    }

    /// The dedup identity of this person, `None` when there is neither a name nor an email.
    pub fn identity(&self) -> Option<PersonIdentity> {
        PersonIdentity::new(&self.name, self.email.as_deref())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionItem {
    pub description: String,
    pub assignee: Option<Participant>,
}

impl ActionItem {
    /// Builds an action item, preferring the assignee the meetings API provided and
    /// falling back to one extracted from the description.
    pub fn new(
        description: &str,
        assignee_name: Option<&str>,
        assignee_email: Option<&str>,
    ) -> Self {
        let description = description.trim().to_string();
        let upstream_name = assignee_name.map(str::trim).filter(|n| !n.is_empty());

        let assignee = match upstream_name {
            Some(name) => Some(Participant::new(name, assignee_email)),
            None => extract_assignee(&description).map(|name| Participant::new(&name, None)),
        };

        Self {
            description,
            assignee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_name_is_reformatted() {
        let participant = Participant::new("Doe, Jane", Some(" jane@example.com "));
        assert_eq!(participant.raw_name, "Doe, Jane");
        assert_eq!(participant.name, "Jane Doe");
        assert_eq!(participant.email.as_deref(), Some("jane@example.com"));
    }

    #[test]
    fn test_action_item_prefers_upstream_assignee() {
        let item = ActionItem::new("@Bob send the deck", Some("Lee, Carol"), None);
        assert_eq!(item.assignee.unwrap().name, "Carol Lee");
    }

    #[test]
    fn test_action_item_falls_back_to_text_extraction() {
        let item = ActionItem::new("Dave: update the slide", Some("  "), None);
        assert_eq!(item.assignee.unwrap().name, "Dave");
    }

    #[test]
    fn test_action_item_without_assignee() {
        let item = ActionItem::new("No owner mentioned here", None, None);
        assert!(item.assignee.is_none());
    }
}
