//! Airtable API client for the meetings, action items and people tables.

use crate::error::Error;
use crate::gateway::RecordStore;
use crate::person::PersonIdentity;
use crate::record::{
    BaseSchema, FieldKind, Fields, PersonSchema, StoreRecord, TableNames, TableRole, TableSchema,
};
use async_trait::async_trait;
use log::*;
use meeting_auth::api_key::{ApiKeyAuth, ApiKeyProvider};
use meeting_auth::http::{AuthenticatedClient, AuthenticatedClientBuilder};
use meeting_auth::Error as MeetingAuthError;
use reqwest::StatusCode;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{json, Value};
use service::config::Config;

#[derive(Debug, Deserialize)]
struct RecordResponse {
    id: String,
    #[serde(default)]
    fields: Fields,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<RecordResponse>,
}

/// Body of `GET /v0/meta/bases/{base}/tables`.
#[derive(Debug, Deserialize)]
struct TablesResponse {
    #[serde(default)]
    tables: Vec<TableMeta>,
}

#[derive(Debug, Deserialize)]
struct TableMeta {
    name: String,
    #[serde(default)]
    fields: Vec<FieldMeta>,
}

#[derive(Debug, Deserialize)]
struct FieldMeta {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
}

fn field_kind(field_type: &str) -> FieldKind {
    match field_type {
        "multipleRecordLinks" | "singleCollaborator" | "multipleCollaborators" => FieldKind::Link,
        "multipleSelects" => FieldKind::MultiSelect,
        _ => FieldKind::Value,
    }
}

/// Airtable returns either `{"error": {"type": .., "message": ..}}` or `{"error": "TYPE"}`.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detailed {
        #[serde(rename = "type")]
        error_type: String,
        #[serde(default)]
        message: Option<String>,
    },
    Plain(String),
}

impl ErrorBody {
    fn describe(&self) -> String {
        match self {
            ErrorBody::Detailed {
                error_type,
                message: Some(message),
            } => format!("{error_type}: {message}"),
            ErrorBody::Detailed { error_type, .. } => error_type.clone(),
            ErrorBody::Plain(error_type) => error_type.clone(),
        }
    }
}

/// Airtable API client
pub struct AirtableClient {
    client: AuthenticatedClient,
    base_url: String,
    base_id: String,
    tables: TableNames,
    person_schema: PersonSchema,
}

impl AirtableClient {
    /// Create a new Airtable client from configuration.
    ///
    /// Fails with a `Config` error when `AIRTABLE_API_KEY` or `AIRTABLE_BASE_ID` is not set.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let api_key = config
            .airtable_api_key()
            .ok_or_else(|| Error::config("AIRTABLE_API_KEY is not set"))?;
        let base_id = config
            .airtable_base_id()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::config("AIRTABLE_BASE_ID is not set"))?;
        let person_schema = PersonSchema {
            name_field: formula_field_name(
                "AIRTABLE_PEOPLE_NAME_FIELD",
                config.airtable_people_name_field(),
            )?,
            email_field: config
                .airtable_people_email_field()
                .map(|field| formula_field_name("AIRTABLE_PEOPLE_EMAIL_FIELD", &field))
                .transpose()?,
        };
        let auth = ApiKeyAuth::new(ApiKeyProvider::Airtable, SecretString::new(api_key))?;

        let client = AuthenticatedClientBuilder::new()
            .with_auth(Box::new(auth))
            .with_connect_timeout(config.http_connect_timeout())
            .with_read_timeout(config.http_read_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.airtable_base_url().trim_end_matches('/').to_string(),
            base_id,
            tables: TableNames {
                meetings: config.airtable_meetings_table().to_string(),
                action_items: config.airtable_action_items_table().to_string(),
                people: config.airtable_participants_table().to_string(),
            },
            person_schema,
        })
    }

    fn table_url(&self, table: TableRole) -> String {
        format!(
            "{}/v0/{}/{}",
            self.base_url,
            self.base_id,
            urlencoding::encode(self.tables.name_for(table))
        )
    }

    /// `filterByFormula` matching the identity's name, and its email when the
    /// people table has an email field.
    fn person_formula(&self, identity: &PersonIdentity) -> String {
        let by_name = format!(
            "LOWER({{{}}}) = '{}'",
            self.person_schema.name_field,
            escape_formula_literal(&identity.name().to_lowercase())
        );

        match (&self.person_schema.email_field, identity.email()) {
            (Some(field), Some(email)) => format!(
                "OR({}, LOWER({{{}}}) = '{}')",
                by_name,
                field,
                escape_formula_literal(email)
            ),
            _ => by_name,
        }
    }

    async fn read_body(response: reqwest::Response) -> Result<(StatusCode, String), Error> {
        let status = response.status();
        let body = response.text().await.map_err(MeetingAuthError::from)?;
        Ok((status, body))
    }
}

/// A field name used as `{Field}` in a formula, which has no escape for braces.
fn formula_field_name(setting: &str, name: &str) -> Result<String, Error> {
    if name.contains(['{', '}']) {
        return Err(Error::config(&format!(
            "{setting} must not contain '{{' or '}}': {name}"
        )));
    }
    Ok(name.to_string())
}

/// Escapes a value for use inside a single-quoted formula string.
fn escape_formula_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn error_for_status(table: TableRole, status: StatusCode, body: &str) -> Error {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.describe())
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            warn!("Airtable rejected {} record: {}", table, detail);
            Error::validation(detail)
        }
        _ => {
            warn!("Airtable API error {} on {} table: {}", status, table, body);
            Error::upstream(format!("Airtable API returned {status}: {detail}"))
        }
    }
}

#[async_trait]
impl RecordStore for AirtableClient {
    fn person_schema(&self) -> &PersonSchema {
        &self.person_schema
    }

    async fn describe_tables(&self) -> Result<BaseSchema, Error> {
        let url = format!("{}/v0/meta/bases/{}/tables", self.base_url, self.base_id);
        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!("Failed to read Airtable base schema: {:?}", e);
            MeetingAuthError::from(e)
        })?;

        let (status, body) = Self::read_body(response).await?;
        if !status.is_success() {
            warn!("Airtable schema request returned {}: {}", status, body);
            return Err(Error::upstream(format!(
                "Airtable schema request returned {status}"
            )));
        }

        let listed: TablesResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to decode Airtable schema response: {:?}", e);
            Error::upstream(format!("Invalid response from Airtable API: {e}"))
        })?;

        let mut schema = BaseSchema::default();
        for role in [TableRole::Meeting, TableRole::ActionItem, TableRole::Person] {
            let name = self.tables.name_for(role);
            match listed.tables.iter().find(|table| table.name == name) {
                Some(table) => schema.insert(
                    role,
                    TableSchema::new(
                        table
                            .fields
                            .iter()
                            .map(|field| (field.name.clone(), field_kind(&field.field_type))),
                    ),
                ),
                None => warn!("Airtable base has no table named \"{}\"", name),
            }
        }
        Ok(schema)
    }

    async fn find_person(&self, identity: &PersonIdentity) -> Result<Option<StoreRecord>, Error> {
        let formula = self.person_formula(identity);
        debug!("Searching people with formula: {}", formula);

        let response = self
            .client
            .get(&self.table_url(TableRole::Person))
            .query(&[("filterByFormula", formula.as_str()), ("maxRecords", "1")])
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to search Airtable people: {:?}", e);
                MeetingAuthError::from(e)
            })?;

        let (status, body) = Self::read_body(response).await?;
        if !status.is_success() {
            return Err(error_for_status(TableRole::Person, status, &body));
        }

        let list: ListResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to decode Airtable list response: {:?}", e);
            Error::upstream(format!("Invalid response from Airtable API: {e}"))
        })?;

        Ok(list.records.into_iter().next().map(|record| StoreRecord {
            id: record.id,
            table: TableRole::Person,
            fields: record.fields,
        }))
    }

    async fn create_record(&self, table: TableRole, fields: Fields) -> Result<StoreRecord, Error> {
        debug!(
            "Creating {} record with fields: {:?}",
            table,
            fields.keys().collect::<Vec<_>>()
        );

        let response = self
            .client
            .post(&self.table_url(table))
            .json(&json!({ "fields": Value::Object(fields) }))
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to create Airtable {} record: {:?}", table, e);
                MeetingAuthError::from(e)
            })?;

        let (status, body) = Self::read_body(response).await?;
        if !status.is_success() {
            return Err(error_for_status(table, status, &body));
        }

        let record: RecordResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to decode Airtable create response: {:?}", e);
            Error::upstream(format!("Invalid response from Airtable API: {e}"))
        })?;

        Ok(StoreRecord {
            id: record.id,
            table,
            fields: record.fields,
        })
    }
}
