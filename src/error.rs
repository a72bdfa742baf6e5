//! Error taxonomy for the console.
//!
//! Every operation returns a tagged [`ConsoleError`]; nothing is retried or
//! swallowed here. The presentation layer turns each variant into an HTTP
//! status plus a `{error, message}` body.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Result type for console operations
pub type Result<T> = std::result::Result<T, ConsoleError>;

#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Missing, invalid or non-admin credential.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Locally detected illegal state change. Never sent to the network.
    #[error("Invalid transition for {entity}: cannot {requested} from {from}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        requested: String,
    },

    /// The order service declined the request.
    #[error("Rejected by order service: {0}")]
    Rejected(String),

    #[error("Order service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Upstream body did not fit the closed data model.
    #[error("Invalid response from order service: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConsoleError {
    pub fn invalid_transition(
        entity: &'static str,
        from: impl ToString,
        requested: impl ToString,
    ) -> Self {
        ConsoleError::InvalidTransition {
            entity,
            from: from.to_string(),
            requested: requested.to_string(),
        }
    }

    /// Stable machine-readable tag for the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            ConsoleError::Unauthorized(_) => "unauthorized",
            ConsoleError::InvalidTransition { .. } => "invalid_transition",
            ConsoleError::Rejected(_) => "rejected",
            ConsoleError::ServiceUnavailable(_) => "service_unavailable",
            ConsoleError::NotFound(_) => "not_found",
            ConsoleError::InvalidFilter(_) => "invalid_filter",
            ConsoleError::InvalidInput(_) => "invalid_input",
            ConsoleError::InvalidResponse(_) => "invalid_response",
            ConsoleError::Config(_) => "config",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ConsoleError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ConsoleError::InvalidTransition { .. } => StatusCode::CONFLICT,
            ConsoleError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ConsoleError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ConsoleError::NotFound(_) => StatusCode::NOT_FOUND,
            ConsoleError::InvalidFilter(_) | ConsoleError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            ConsoleError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            ConsoleError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ConsoleError::InvalidResponse(err.to_string())
        } else {
            ConsoleError::ServiceUnavailable(err.to_string())
        }
    }
}

// Extractor rejections keep the `{error, message}` body shape.

impl From<QueryRejection> for ConsoleError {
    fn from(rejection: QueryRejection) -> Self {
        ConsoleError::InvalidFilter(rejection.body_text())
    }
}

impl From<JsonRejection> for ConsoleError {
    fn from(rejection: JsonRejection) -> Self {
        ConsoleError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for ConsoleError {
    fn from(rejection: PathRejection) -> Self {
        ConsoleError::InvalidInput(rejection.body_text())
    }
}

/// JSON error body returned by the console routes.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
