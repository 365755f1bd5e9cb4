//! Error types for the Handoff server

use handoff_core::EngineError;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Engine error bubbled up from handoff-core
    #[error("Engine error: {0}")]
    EngineError(#[from] EngineError),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_conversion() {
        let engine_err = EngineError::FlowNotFound("flow1".to_string());
        let server_err: ServerError = engine_err.into();
        assert!(matches!(server_err, ServerError::EngineError(_)));
        assert_eq!(server_err.to_string(), "Engine error: Flow not found: flow1");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ServerError::ConfigError("bad port".to_string()).to_string(),
            "Configuration error: bad port"
        );
    }
}
