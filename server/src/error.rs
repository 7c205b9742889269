//! Unified error handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fleet_engine::ErrorKind;
use serde::{Deserialize, Serialize};

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] fleet_engine::Error),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind
    pub error: String,
    /// Human-readable message
    pub detail: String,
}

/// Transport status for each engine error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound | ErrorKind::ReferenceNotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyExists
        | ErrorKind::Conflict
        | ErrorKind::InvalidDate
        | ErrorKind::InvalidId
        | ErrorKind::PastDateLocked => StatusCode::BAD_REQUEST,
        ErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, detail) = match &self {
            AppError::Engine(e) => {
                let kind = e.kind();
                let status = status_for(kind);
                if status.is_server_error() {
                    tracing::error!("Store error: {:?}", e);
                    (status, kind.to_string(), "Internal server error".to_string())
                } else {
                    tracing::debug!("Request rejected: {}", e);
                    (status, kind.to_string(), e.to_string())
                }
            }
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "bad_request".to_string(),
                msg.clone(),
            ),
        };

        (status, Json(ErrorResponse { error, detail })).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_engine::{Collection, StoreError};

    #[test]
    fn kinds_map_to_statuses() {
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::ReferenceNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::AlreadyExists), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::PastDateLocked), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(ErrorKind::Store),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn engine_error_response() {
        let response =
            AppError::from(fleet_engine::Error::AlreadyExists(Collection::Employees)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_error_hides_details() {
        let err = fleet_engine::Error::Store(StoreError::Backend("password leaked".into()));
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
