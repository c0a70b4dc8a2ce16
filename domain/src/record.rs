//! Rows in the tabular record store.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Field name to value mapping of one row.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// The three tables the sync writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRole {
    Meeting,
    ActionItem,
    Person,
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TableRole::Meeting => write!(f, "meeting"),
            TableRole::ActionItem => write!(f, "action_item"),
            TableRole::Person => write!(f, "person"),
        }
    }
}

/// A row as returned by the store. The id is assigned by the store on create.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoreRecord {
    pub id: String,
    pub table: TableRole,
    pub fields: Fields,
}

/// Configured table names for each role.
#[derive(Clone, Debug, PartialEq)]
pub struct TableNames {
    pub meetings: String,
    pub action_items: String,
    pub people: String,
}

impl TableNames {
    pub fn name_for(&self, table: TableRole) -> &str {
        match table {
            TableRole::Meeting => &self.meetings,
            TableRole::ActionItem => &self.action_items,
            TableRole::Person => &self.people,
        }
    }
}

/// Which fields of the people table hold a person's name and email.
#[derive(Clone, Debug, PartialEq)]
pub struct PersonSchema {
    pub name_field: String,
    /// Emails are neither written nor matched when this is `None`.
    pub email_field: Option<String>,
}

impl Default for PersonSchema {
    fn default() -> Self {
        Self {
            name_field: "Name".to_string(),
            email_field: None,
        }
    }
}

/// How a column stores its value, as far as the sync needs to know.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Holds ids of rows in another table (or of users).
    Link,
    /// Holds a list of option names.
    MultiSelect,
    /// Any other column: text, number, date, url and so on.
    Value,
}

/// Columns of one table by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableSchema {
    fields: HashMap<String, FieldKind>,
}

impl TableSchema {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, FieldKind)>,
        S: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, kind)| (name.into(), kind))
                .collect(),
        }
    }

    pub fn kind(&self, field: &str) -> Option<FieldKind> {
        self.fields.get(field).copied()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }
}

/// Column layouts of the sync's tables. A table the store did not describe is absent,
/// and writes to it fall back to sending record links.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BaseSchema {
    tables: HashMap<TableRole, TableSchema>,
}

impl BaseSchema {
    pub fn insert(&mut self, table: TableRole, schema: TableSchema) {
        self.tables.insert(table, schema);
    }

    pub fn table(&self, table: TableRole) -> Option<&TableSchema> {
        self.tables.get(&table)
    }
}

/// Field names of the meetings table.
pub mod meeting_fields {
    pub const TITLE: &str = "Title";
    pub const RECORDING_URL: &str = "Recording URL";
    pub const EMBED_URL: &str = "Embed URL";
    pub const SUMMARY: &str = "Summary";
    pub const START_TIME: &str = "Start Time";
    pub const DURATION: &str = "Duration";
    pub const PARTICIPANTS: &str = "Participants";
    pub const CALL_ID: &str = "Fathom Call ID";
    pub const TRANSCRIPT_URL: &str = "Transcript URL";
    pub const TRANSCRIPT: &str = "Transcript";
}

/// Field names of the action items table.
pub mod action_item_fields {
    pub const DESCRIPTION: &str = "Description";
    pub const STATUS: &str = "Status";
    pub const MEETING: &str = "Meeting";
    pub const ASSIGNED_TO: &str = "Assigned To";

    /// Status every newly synced action item starts in.
    pub const STATUS_TODO: &str = "To Do";
}
