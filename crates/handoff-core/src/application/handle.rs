use std::sync::Arc;

use crate::application::engine::FlowEngine;
use crate::domain::flow::FlowId;
use crate::EngineError;

/// Workflow-facing handle scoped to a single flow.
///
/// Workflow code receives one of these from [`FlowEngine::start_flow`] and
/// drives the flow through it; the handle never exposes other flows.
#[derive(Clone)]
pub struct FlowHandle {
    engine: Arc<FlowEngine>,
    flow_id: FlowId,
}

impl FlowHandle {
    pub(crate) fn new(engine: Arc<FlowEngine>, flow_id: FlowId) -> Self {
        Self { engine, flow_id }
    }

    /// The id of the flow this handle is scoped to
    pub fn flow_id(&self) -> &FlowId {
        &self.flow_id
    }

    /// The externally reachable URL of this flow
    pub fn url(&self) -> String {
        self.engine.flow_url(&self.flow_id)
    }

    /// Request one piece of input and suspend until it arrives.
    ///
    /// Resolves to the submitted value, or fails with
    /// [`EngineError::Aborted`] if the flow's deadline cancelled the step.
    pub async fn input(&self, label: &str) -> Result<String, EngineError> {
        self.engine.request_input(&self.flow_id, label).await
    }

    /// Mark the flow done. No further steps can be requested afterwards.
    pub async fn end(&self) -> Result<(), EngineError> {
        self.engine.end_flow(&self.flow_id).await
    }
}
