//! JSON error bodies for the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::error::AgentsError;

/// An error returned to HTTP clients as `{error, status: "error"}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Whether the body carries a `timestamp` field.
    pub timestamped: bool,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            timestamped: false,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn not_initialized() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Multi-agent system not initialized",
        )
    }

    pub fn with_timestamp(mut self) -> Self {
        self.timestamped = true;
        self
    }
}

impl From<AgentsError> for ApiError {
    fn from(err: AgentsError) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal server error: {err}"),
        )
        .with_timestamp()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.message,
            "status": "error",
        });
        if self.timestamped {
            body["timestamp"] = json!(super::routes::timestamp());
        }
        (self.status, Json(body)).into_response()
    }
}
