//! API error responses.
//!
//! Every error leaving the HTTP surface is rendered as
//! `{"error": "<message>", "status": <code>}` with a matching HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use handoff_core::EngineError;
use serde_json::json;

use crate::error::ServerError;

/// An error response returned by an API handler
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,

    /// Human-readable message
    pub message: String,
}

impl ApiError {
    /// Build an error with an explicit status
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 404 for a missing resource
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 400 for a submission the surface refuses to pass to the engine
    pub fn invalid_submission(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let status = match &err {
            EngineError::FlowNotFound(_)
            | EngineError::FlowNotStarted(_)
            | EngineError::StepNotFound(_) => StatusCode::NOT_FOUND,
            EngineError::InvalidSubmission(_) => StatusCode::BAD_REQUEST,
            EngineError::DuplicateFlow(_) | EngineError::FlowTerminated(_) => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ServerError> for ApiError {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::EngineError(inner) => inner.into(),
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16(),
        }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_mapping() {
        let err: ApiError = EngineError::FlowNotFound("flow1".to_string()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err: ApiError = EngineError::InvalidSubmission("empty value".to_string()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: ApiError = EngineError::FlowTerminated("flow1".to_string()).into();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err: ApiError = EngineError::Other("boom".to_string()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_server_error_mapping() {
        let err: ApiError = ServerError::ConfigError("bad".to_string()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        let err: ApiError =
            ServerError::EngineError(EngineError::FlowNotFound("flow1".to_string())).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_wire_shape() {
        let err = ApiError::not_found("Flow not found: flow1");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
