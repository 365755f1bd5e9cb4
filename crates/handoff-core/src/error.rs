use thiserror::Error;

/// Core error type for the Handoff engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Flow not found in the registry
    #[error("Flow not found: {0}")]
    FlowNotFound(String),

    /// A flow with the same id already exists
    #[error("Flow already exists: {0}")]
    DuplicateFlow(String),

    /// Workflow code referenced a flow whose backing state is missing
    #[error("Flow not started: {0}")]
    FlowNotStarted(String),

    /// Operation addressed at a flow that already reached a terminal status
    #[error("Flow already terminated: {0}")]
    FlowTerminated(String),

    /// Step not found within its flow
    #[error("Step not found: {0}")]
    StepNotFound(String),

    /// A pending step was aborted; carries the abort reason (e.g. "Timeout")
    #[error("Step aborted: {0}")]
    Aborted(String),

    /// Submission body missing or without a usable value
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    /// State store error
    #[error("State store error: {0}")]
    StateStoreError(String),

    /// Timer error
    #[error("Timer error: {0}")]
    TimerError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Other(format!("Serialization error: {}", err))
    }
}

impl From<String> for EngineError {
    fn from(err: String) -> Self {
        EngineError::Other(err)
    }
}

impl From<&str> for EngineError {
    fn from(err: &str) -> Self {
        EngineError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            (
                EngineError::FlowNotFound("flow1".to_string()),
                "Flow not found: flow1",
            ),
            (
                EngineError::DuplicateFlow("flow1".to_string()),
                "Flow already exists: flow1",
            ),
            (
                EngineError::FlowNotStarted("flow2".to_string()),
                "Flow not started: flow2",
            ),
            (
                EngineError::FlowTerminated("flow3".to_string()),
                "Flow already terminated: flow3",
            ),
            (
                EngineError::StepNotFound("step1".to_string()),
                "Step not found: step1",
            ),
            (
                EngineError::Aborted("Timeout".to_string()),
                "Step aborted: Timeout",
            ),
            (
                EngineError::InvalidSubmission("missing value".to_string()),
                "Invalid submission: missing value",
            ),
            (
                EngineError::StateStoreError("lock".to_string()),
                "State store error: lock",
            ),
            (
                EngineError::TimerError("expired".to_string()),
                "Timer error: expired",
            ),
            (EngineError::Other("other".to_string()), "other"),
        ];

        for (error, expected) in errors {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_from_string() {
        let error: EngineError = "boom".to_string().into();
        assert_eq!(error, EngineError::Other("boom".to_string()));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let error: EngineError = json_error.into();
        match error {
            EngineError::Other(msg) => assert!(msg.contains("Serialization error")),
            _ => panic!("Expected Other variant"),
        }
    }
}
