//! Find-or-create of Person records, deduplicated within one sync run.

use crate::error::Error;
use crate::gateway::RecordStore;
use crate::record::{Fields, PersonSchema, StoreRecord, TableRole};
use crate::text::collapse_whitespace;
use log::*;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Normalized key used to deduplicate people.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PersonIdentity {
    name: String,
    email: Option<String>,
}

impl PersonIdentity {
    /// Normalizes a (already "First Last" formatted) name and an optional email.
    ///
    /// The email stands in for the name when the name is blank; `None` when both are blank.
    pub fn new(name: &str, email: Option<&str>) -> Option<Self> {
        let email = email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());
        let name = collapse_whitespace(name);
        let name = if name.is_empty() { email.clone()? } else { name };

        Some(Self { name, email })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    fn email_key(&self) -> Option<String> {
        self.email.as_ref().map(|email| format!("email:{email}"))
    }

    fn name_key(&self) -> String {
        format!("name:{}", self.name.to_lowercase())
    }
}

/// Person records seen during one sync run.
///
/// An identity carrying an email is looked up by email only, so two different
/// people who share a display name are not merged. Records are stored under
/// every key of the identity they were resolved for.
#[derive(Debug, Default)]
pub struct IdentityCache {
    by_key: HashMap<String, StoreRecord>,
    created: Vec<String>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: &PersonIdentity) -> Option<&StoreRecord> {
        match identity.email_key() {
            Some(key) => self.by_key.get(&key),
            None => self.by_key.get(&identity.name_key()),
        }
    }

    fn insert(&mut self, identity: &PersonIdentity, record: &StoreRecord) {
        if let Some(key) = identity.email_key() {
            self.by_key.insert(key, record.clone());
        }
        self.by_key
            .entry(identity.name_key())
            .or_insert_with(|| record.clone());
    }

    /// Ids of the Person records this run created, in creation order.
    pub fn created_ids(&self) -> &[String] {
        &self.created
    }
}

/// Fields of a new Person row for the identity.
pub fn person_fields(schema: &PersonSchema, identity: &PersonIdentity) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        schema.name_field.clone(),
        Value::String(identity.name().to_string()),
    );
    if let (Some(field), Some(email)) = (&schema.email_field, identity.email()) {
        fields.insert(field.clone(), Value::String(email.to_string()));
    }
    fields
}

/// Returns the Person record for `identity`, creating it when neither this run nor the
/// store knows it yet.
///
/// Never creates two rows for the same identity within one run. Separate runs share
/// nothing, so concurrent deliveries may each create a row unless the store enforces
/// uniqueness.
pub async fn resolve_or_create_person(
    store: &dyn RecordStore,
    cache: &mut IdentityCache,
    identity: &PersonIdentity,
) -> Result<StoreRecord, Error> {
    if let Some(record) = cache.get(identity) {
        trace!("Person cache hit for {} ({})", identity.name(), record.id);
        return Ok(record.clone());
    }

    let record = match store.find_person(identity).await? {
        Some(record) => {
            info!("Found existing person: {} ({})", identity.name(), record.id);
            record
        }
        None => {
            let fields = person_fields(store.person_schema(), identity);
            let record = store.create_record(TableRole::Person, fields).await?;
            info!("Created new person: {} ({})", identity.name(), record.id);
            cache.created.push(record.id.clone());
            record
        }
    };

    cache.insert(identity, &record);
    Ok(record)
}
