use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use domain::error::{DomainErrorKind, ExternalErrorKind};
use domain::{Committed, SyncError, SyncStage};
use log::*;
use serde::Serialize;

pub type Result<T> = core::result::Result<T, Error>;

/// A failed sync together with the id of the webhook delivery it belongs to.
#[derive(Debug)]
pub struct Error {
    correlation_id: String,
    sync_error: SyncError,
}

impl Error {
    pub fn new(correlation_id: &str, sync_error: SyncError) -> Self {
        Self {
            correlation_id: correlation_id.to_string(),
            sync_error,
        }
    }

    fn status_code(&self) -> StatusCode {
        match &self.sync_error.error.error_kind {
            DomainErrorKind::External(external_error_kind) => match external_error_kind {
                ExternalErrorKind::Validation(_) => StatusCode::BAD_REQUEST,
                ExternalErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
                ExternalErrorKind::Upstream(_) => StatusCode::BAD_GATEWAY,
                ExternalErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            },
            DomainErrorKind::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.sync_error)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "[{}] {}", self.correlation_id, self.sync_error)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    stage: SyncStage,
    error_kind: &'static str,
    message: String,
    correlation_id: &'a str,
    committed: &'a Committed,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }

        let body = ErrorBody {
            status: "error",
            stage: self.sync_error.stage,
            error_kind: self.sync_error.error.kind_label(),
            message: self.sync_error.error.message(),
            correlation_id: &self.correlation_id,
            committed: &self.sync_error.committed,
        };
        (status_code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::error::Error as DomainError;

    fn status_for(error: DomainError) -> StatusCode {
        Error::new("c1", SyncError::new(SyncStage::FetchRecording, error)).status_code()
    }

    #[test]
    fn test_status_codes_follow_error_kind() {
        assert_eq!(
            status_for(DomainError::validation("bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(DomainError::not_found("gone")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(DomainError::upstream("500")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(DomainError::config("FATHOM_API_KEY is not set")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display_includes_correlation_id_and_stage() {
        let error = Error::new(
            "abc-123",
            SyncError::new(SyncStage::Parse, DomainError::validation("missing id")),
        );
        let rendered = error.to_string();
        assert!(rendered.starts_with("[abc-123]"));
        assert!(rendered.contains("parse"));
    }
}
