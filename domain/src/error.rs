//! Error types for the `domain` layer.
use meeting_auth::error::{Error as MeetingAuthError, ErrorKind as MeetingAuthErrorKind, HttpErrorKind};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error. `web` uses the `error_kind` to pick HTTP status codes and the
/// stage-tagged error body returned to the webhook caller.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Errors caused by this process: misconfiguration or unexpected states.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Config,
    Other(String),
}

/// Errors caused by input or by one of the external services.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    /// Bad or missing input, or a field set the record store rejected. Not retryable.
    Validation(String),
    /// The requested recording does not exist upstream. Not retryable.
    NotFound(String),
    /// Non-success response or malformed body from an external API.
    Upstream(String),
    /// A connect or read deadline was exceeded.
    Timeout,
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::external(ExternalErrorKind::Validation(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::external(ExternalErrorKind::NotFound(message.into()))
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::external(ExternalErrorKind::Upstream(message.into()))
    }

    pub fn config(message: &str) -> Self {
        Error {
            source: Some(message.to_string().into()),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }

    fn external(kind: ExternalErrorKind) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::External(kind),
        }
    }

    /// Short machine-readable label used in logs and error responses.
    pub fn kind_label(&self) -> &'static str {
        match &self.error_kind {
            DomainErrorKind::External(ExternalErrorKind::Validation(_)) => "validation",
            DomainErrorKind::External(ExternalErrorKind::NotFound(_)) => "not_found",
            DomainErrorKind::External(ExternalErrorKind::Upstream(_)) => "upstream",
            DomainErrorKind::External(ExternalErrorKind::Timeout) => "timeout",
            DomainErrorKind::Internal(InternalErrorKind::Config) => "config",
            DomainErrorKind::Internal(InternalErrorKind::Other(_)) => "internal",
        }
    }

    /// Whether the caller may reasonably try the same request again later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Upstream(_))
                | DomainErrorKind::External(ExternalErrorKind::Timeout)
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Validation(_))
        )
    }

    /// Human readable description without the debug representation of the source chain.
    pub fn message(&self) -> String {
        match &self.error_kind {
            DomainErrorKind::External(ExternalErrorKind::Validation(msg))
            | DomainErrorKind::External(ExternalErrorKind::NotFound(msg))
            | DomainErrorKind::External(ExternalErrorKind::Upstream(msg))
            | DomainErrorKind::Internal(InternalErrorKind::Other(msg)) => msg.clone(),
            DomainErrorKind::External(ExternalErrorKind::Timeout) => match &self.source {
                Some(source) => format!("request timed out: {source}"),
                None => "request timed out".to_string(),
            },
            DomainErrorKind::Internal(InternalErrorKind::Config) => match &self.source {
                Some(source) => format!("configuration error: {source}"),
                None => "configuration error".to_string(),
            },
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error ({}): {}", self.kind_label(), self.message())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `meeting-auth` HTTP layer to the `domain` layer.
impl From<MeetingAuthError> for Error {
    fn from(err: MeetingAuthError) -> Self {
        let error_kind = match &err.error_kind {
            MeetingAuthErrorKind::Http(HttpErrorKind::Timeout) => {
                DomainErrorKind::External(ExternalErrorKind::Timeout)
            }
            MeetingAuthErrorKind::Http(HttpErrorKind::BuilderFailed) => DomainErrorKind::Internal(
                InternalErrorKind::Other("Failed to build HTTP client".to_string()),
            ),
            MeetingAuthErrorKind::Http(_) => {
                DomainErrorKind::External(ExternalErrorKind::Upstream(err.to_string()))
            }
            MeetingAuthErrorKind::ApiKey(_) => DomainErrorKind::Internal(InternalErrorKind::Config),
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}
