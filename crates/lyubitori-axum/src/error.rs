//! Axum-specific error types and mappings.
//!
//! Maps registry errors to HTTP status codes and a JSON body of
//! the form `{"error": "...", "status": 404}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lyubitori_download::RegistryError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (invalid input).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflict with the resource's current state.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl HttpError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) | Self::BadRequest(msg) | Self::Conflict(msg) => msg,
        }
    }
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::debug!(target: "lyubitori.http", status = status.as_u16(), error = %self, "Request rejected");

        let body = ErrorBody {
            error: self.message(),
            status: status.as_u16(),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<RegistryError> for HttpError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(_) => Self::NotFound("Task not found".to_string()),
            RegistryError::AlreadyFinished { .. } => Self::Conflict("Task already finished".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyubitori_core::{TaskId, TaskStatus};

    #[test]
    fn test_registry_error_mapping() {
        let id = TaskId::new();
        assert_eq!(
            HttpError::from(RegistryError::NotFound(id)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HttpError::from(RegistryError::AlreadyFinished {
                id,
                status: TaskStatus::Completed
            })
            .status_code(),
            StatusCode::CONFLICT
        );
    }
}
