use std::path::PathBuf;
use std::process::ExitStatus;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::transfer_objects::TransferKind;

/// Conditions that stop the process before it starts serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("transfer tool `{0}` was not found on PATH")]
    ToolNotFound(String),

    #[error("log directory {} is not a directory", .0.display())]
    InvalidLogDirectory(PathBuf),
}

/// Reasons a launched transfer ends up `failed`.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to open file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error waiting for the transfer tool: {source}")]
    Wait {
        #[source]
        source: std::io::Error,
    },

    #[error("transfer tool exited with {status}")]
    ExitStatus { status: ExitStatus },
}

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no {kind} record with id {id}")]
    NotFound { kind: TransferKind, id: String },

    #[error("error serializing {kind} record: {source}")]
    Serialization {
        kind: TransferKind,
        #[source]
        source: serde_json::Error,
    },
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            // Unknown ids get a bare 404, nothing in the body.
            ApiError::NotFound { .. } => HttpResponse::NotFound().finish(),
            ApiError::Serialization { .. } => HttpResponse::build(self.status_code())
                .content_type("text/plain; charset=utf-8")
                .body(self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404_with_empty_body() {
        let err = ApiError::NotFound {
            kind: TransferKind::Upload,
            id: "nope".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn serialization_failure_maps_to_500_naming_the_kind() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ApiError::Serialization {
            kind: TransferKind::Download,
            source,
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("error serializing download record"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn log_file_error_names_the_path() {
        let err = RunError::LogFile {
            path: PathBuf::from("/nowhere/uploads.stdout.log"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/nowhere/uploads.stdout.log"));
    }
}
