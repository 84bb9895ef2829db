//! Footfall — API error types.

use axum::Json;
use axum::extract::rejection::BytesRejection;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Startup errors for the API server. Any of these stops the process before
/// it begins serving.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection, pool or schema provisioning error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

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

/// Per-request errors, mapped to a status code in one place.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body or frame was not a valid capture payload.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// The request body could not be read, e.g. it exceeded the size limit.
    #[error("unreadable body: {message}")]
    UnreadableBody {
        /// Status chosen by the body extractor.
        status: StatusCode,
        /// Why the body was refused.
        message: String,
    },

    /// The request could not be upgraded to a WebSocket.
    #[error("upgrade failed: {message}")]
    Upgrade {
        /// Status chosen by the upgrade extractor.
        status: StatusCode,
        /// Why the upgrade was refused.
        message: String,
    },

    /// The streaming upgrade came from an origin not on the allow-list.
    #[error("origin not allowed: {0}")]
    OriginRejected(String),

    /// No route matches the request path.
    #[error("no route for {0}")]
    NotFound(String),

    /// An unexpected fault, e.g. a recovered panic.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<WebSocketUpgradeRejection> for ApiError {
    fn from(rejection: WebSocketUpgradeRejection) -> Self {
        Self::Upgrade {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::UnreadableBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            Self::MalformedPayload(_) => (StatusCode::BAD_REQUEST, "malformed_payload"),
            Self::UnreadableBody { status, .. } => (*status, "unreadable_body"),
            Self::Upgrade { status, .. } => (*status, "upgrade_failed"),
            Self::OriginRejected(_) => (StatusCode::FORBIDDEN, "origin_rejected"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = ErrorBody {
            error: error_code,
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
