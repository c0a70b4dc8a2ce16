//! In-memory `RecordStore` used by unit tests.

use crate::error::Error;
use crate::gateway::RecordStore;
use crate::person::PersonIdentity;
use crate::record::{BaseSchema, Fields, PersonSchema, StoreRecord, TableRole};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Keeps every created row and lets a test queue failures for upcoming calls.
pub(crate) struct InMemoryStore {
    schema: PersonSchema,
    tables: Mutex<Result<BaseSchema, Error>>,
    rows: Mutex<Vec<StoreRecord>>,
    seeded: Mutex<usize>,
    finds: Mutex<usize>,
    find_failures: Mutex<VecDeque<Error>>,
    // Keyed by table and zero-based create attempt within that table.
    create_failures: Mutex<HashMap<(TableRole, usize), Error>>,
    attempts: Mutex<HashMap<TableRole, usize>>,
}

impl InMemoryStore {
    pub(crate) fn new() -> Self {
        Self::with_schema(PersonSchema::default())
    }

    pub(crate) fn with_schema(schema: PersonSchema) -> Self {
        Self {
            schema,
            tables: Mutex::new(Ok(BaseSchema::default())),
            rows: Mutex::new(Vec::new()),
            seeded: Mutex::new(0),
            finds: Mutex::new(0),
            find_failures: Mutex::new(VecDeque::new()),
            create_failures: Mutex::new(HashMap::new()),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn seed_person(&self, name: &str, email: Option<&str>) -> StoreRecord {
        let mut fields = Fields::new();
        fields.insert(
            self.schema.name_field.clone(),
            Value::String(name.to_string()),
        );
        if let (Some(field), Some(email)) = (&self.schema.email_field, email) {
            fields.insert(field.clone(), Value::String(email.to_string()));
        }

        let mut seeded = self.seeded.lock().unwrap();
        let record = StoreRecord {
            id: format!("seed{}", *seeded),
            table: TableRole::Person,
            fields,
        };
        *seeded += 1;
        self.rows.lock().unwrap().push(record.clone());
        record
    }

    /// Sets what `describe_tables` answers: a schema, or an error.
    pub(crate) fn set_tables(&self, tables: Result<BaseSchema, Error>) {
        *self.tables.lock().unwrap() = tables;
    }

    pub(crate) fn fail_next_find(&self, error: Error) {
        self.find_failures.lock().unwrap().push_back(error);
    }

    /// Fails the `index`-th create attempt (zero-based) on `table`.
    pub(crate) fn fail_create(&self, table: TableRole, index: usize, error: Error) {
        self.create_failures
            .lock()
            .unwrap()
            .insert((table, index), error);
    }

    /// Rows created through `create_record`, in creation order.
    pub(crate) fn created(&self, table: TableRole) -> Vec<StoreRecord> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.table == table && !r.id.starts_with("seed"))
            .cloned()
            .collect()
    }

    pub(crate) fn create_count(&self, table: TableRole) -> usize {
        self.created(table).len()
    }

    pub(crate) fn find_count(&self) -> usize {
        *self.finds.lock().unwrap()
    }

    fn field_matches(fields: &Fields, field: &str, expected: &str) -> bool {
        fields
            .get(field)
            .and_then(Value::as_str)
            .map(|value| value.to_lowercase() == expected.to_lowercase())
            .unwrap_or(false)
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn person_schema(&self) -> &PersonSchema {
        &self.schema
    }

    async fn describe_tables(&self) -> Result<BaseSchema, Error> {
        match &*self.tables.lock().unwrap() {
            Ok(tables) => Ok(tables.clone()),
            Err(error) => Err(Error::upstream(error.message())),
        }
    }

    async fn find_person(&self, identity: &PersonIdentity) -> Result<Option<StoreRecord>, Error> {
        *self.finds.lock().unwrap() += 1;
        if let Some(error) = self.find_failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        let rows = self.rows.lock().unwrap();
        let found = rows.iter().find(|row| {
            let by_name = Self::field_matches(&row.fields, &self.schema.name_field, identity.name());
            let by_email = match (&self.schema.email_field, identity.email()) {
                (Some(field), Some(email)) => Self::field_matches(&row.fields, field, email),
                _ => false,
            };
            row.table == TableRole::Person && (by_name || by_email)
        });
        Ok(found.cloned())
    }

    async fn create_record(&self, table: TableRole, fields: Fields) -> Result<StoreRecord, Error> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let counter = attempts.entry(table).or_insert(0);
            let attempt = *counter;
            *counter += 1;
            attempt
        };

        if let Some(error) = self.create_failures.lock().unwrap().remove(&(table, attempt)) {
            return Err(error);
        }

        let mut rows = self.rows.lock().unwrap();
        let prefix = match table {
            TableRole::Meeting => "recMeeting",
            TableRole::ActionItem => "recAction",
            TableRole::Person => "recPerson",
        };
        let record = StoreRecord {
            id: format!("{prefix}{attempt}"),
            table,
            fields,
        };
        rows.push(record.clone());
        Ok(record)
    }
}
