//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use relay_core::error::{RelayError, StoreError};
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The ledger could not be opened.
    #[error("ledger error: {0}")]
    Store(#[from] StoreError),

    /// The engine rejected its settings or failed to recover.
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),

    /// The tracing pipeline could not be installed.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer error that implements `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// A relay command was rejected.
    Relay(RelayError),
    /// An admin route was called without a valid token.
    Unauthorized,
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        Self::Relay(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Self::Relay(err) => {
                let (status, code) = match err {
                    RelayError::NotRegistered(_) => (StatusCode::NOT_FOUND, "not_registered"),
                    RelayError::AlreadyWaiting(_) => (StatusCode::CONFLICT, "already_waiting"),
                    RelayError::AlreadyTaken(_) => (StatusCode::CONFLICT, "already_taken"),
                    RelayError::NotYourTurn(_) => (StatusCode::FORBIDDEN, "not_your_turn"),
                    RelayError::NotAuthorized(_) => (StatusCode::FORBIDDEN, "not_authorized"),
                    RelayError::InvalidDuration(_) => {
                        (StatusCode::BAD_REQUEST, "invalid_duration")
                    }
                    RelayError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
                };
                (status, code, err.to_string())
            }
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "missing or invalid admin token".to_owned(),
            ),
        };

        let body = ErrorBody {
            error: error_code,
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use relay_core::participant::ParticipantId;

    fn status_of(err: RelayError) -> StatusCode {
        let response = ApiError::from(err).into_response();
        response.status()
    }

    #[test]
    fn test_not_registered_maps_to_404() {
        assert_eq!(
            status_of(RelayError::NotRegistered(ParticipantId(1))),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_registration_conflicts_map_to_409() {
        assert_eq!(
            status_of(RelayError::AlreadyWaiting(ParticipantId(1))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(RelayError::AlreadyTaken(ParticipantId(1))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_turn_violations_map_to_403() {
        assert_eq!(
            status_of(RelayError::NotYourTurn(ParticipantId(1))),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(RelayError::NotAuthorized(ParticipantId(1))),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_invalid_duration_maps_to_400() {
        assert_eq!(
            status_of(RelayError::InvalidDuration(-5)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_store_failure_maps_to_500() {
        assert_eq!(
            status_of(RelayError::Store(StoreError::Database("disk full".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_maps_to_401() {
        assert_eq!(
            ApiError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
