//! Sync of processed Fathom meeting recordings into Airtable.
//!
//! The `web` layer hands every webhook payload to [`sync::handle_webhook`] together with a
//! [`gateway::RecordingSource`] and a [`gateway::RecordStore`]. Production wires in the
//! Fathom and Airtable clients from [`gateway`]; tests substitute fakes.

pub use gateway::airtable::AirtableClient;
pub use gateway::fathom::FathomClient;
pub use gateway::{RecordStore, RecordingSource};
pub use sync::{handle_webhook, ActionItemOutcome, Committed, SyncError, SyncResult, SyncStage};

pub mod error;
pub mod person;
pub mod record;
pub mod recording;
pub mod sync;
pub mod text;

pub mod gateway;

#[cfg(test)]
pub(crate) mod test_support;
