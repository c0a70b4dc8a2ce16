//! Outbound clients for the meetings API and the record store, and the traits
//! the sync is written against.

use crate::error::Error;
use crate::person::PersonIdentity;
use crate::record::{BaseSchema, Fields, PersonSchema, StoreRecord, TableRole};
use crate::recording::Recording;
use async_trait::async_trait;

pub mod airtable;
pub mod fathom;

/// Source of processed meeting recordings.
#[async_trait]
pub trait RecordingSource: Send + Sync {
    /// Fetch one recording by its recording (call) id.
    ///
    /// Fails with `NotFound` when no such recording exists upstream, `Timeout` when a
    /// deadline is exceeded and `Upstream` for any other failed or malformed response.
    async fn fetch_recording(&self, recording_id: &str) -> Result<Recording, Error>;
}

/// Tabular record store holding meetings, action items and people.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Field layout of the people table.
    fn person_schema(&self) -> &PersonSchema;

    /// Column layouts of the tables the sync writes to. A store that cannot describe
    /// its tables returns an empty schema.
    async fn describe_tables(&self) -> Result<BaseSchema, Error> {
        Ok(BaseSchema::default())
    }

    /// First person whose name (or email, when the schema has an email field) matches
    /// the identity case-insensitively.
    async fn find_person(&self, identity: &PersonIdentity) -> Result<Option<StoreRecord>, Error>;

    /// Create one row. A field set the store refuses surfaces as `Validation`.
    async fn create_record(&self, table: TableRole, fields: Fields) -> Result<StoreRecord, Error>;
}
