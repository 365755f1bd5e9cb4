//! The server aggregate and the wire representations of flows and steps

use std::sync::Arc;

use handoff_core::{Flow, FlowEngine, Step};
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;

/// The Handoff server: the engine plus the configuration the HTTP surface
/// needs. One instance is shared across all request handlers.
pub struct HandoffServer {
    /// Server configuration
    pub config: ServerConfig,

    /// The flow engine serving this process
    pub engine: Arc<FlowEngine>,
}

impl HandoffServer {
    /// Create a server around an already-wired engine
    pub fn new(config: ServerConfig, engine: Arc<FlowEngine>) -> Self {
        Self { config, engine }
    }
}

/// Wire representation of a step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepView {
    /// Step id, used to address submissions
    pub id: String,

    /// Prompt label
    pub label: String,

    /// Current status
    pub status: handoff_core::StepStatus,

    /// The submitted answer, once done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// The abort reason, once aborted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted_reason: Option<String>,
}

impl From<&Step> for StepView {
    fn from(step: &Step) -> Self {
        Self {
            id: step.id.0.clone(),
            label: step.label.clone(),
            status: step.status,
            value: step.value.clone(),
            aborted_reason: step.aborted_reason.clone(),
        }
    }
}

/// Wire representation of a flow with its steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowView {
    /// Flow id
    pub id: String,

    /// Flow title
    pub title: String,

    /// Current status
    pub status: handoff_core::FlowStatus,

    /// Steps in request order
    pub steps: Vec<StepView>,
}

impl From<&Flow> for FlowView {
    fn from(flow: &Flow) -> Self {
        Self {
            id: flow.id.0.clone(),
            title: flow.title.clone(),
            status: flow.status,
            steps: flow.steps.iter().map(StepView::from).collect(),
        }
    }
}

/// One row in the flow listing on the landing page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSummary {
    /// Flow id
    pub id: String,

    /// Flow title
    pub title: String,

    /// Current status
    pub status: handoff_core::FlowStatus,

    /// How many steps still await an answer
    pub pending_steps: usize,

    /// Link to the flow page
    pub url: String,
}

impl FlowSummary {
    /// Build a summary row for the given flow
    pub fn new(flow: &Flow, engine: &FlowEngine) -> Self {
        Self {
            id: flow.id.0.clone(),
            title: flow.title.clone(),
            status: flow.status,
            pending_steps: flow.pending_step_ids().len(),
            url: engine.flow_url(&flow.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_core::{StepKind, StepStatus};

    #[test]
    fn test_flow_view_from_flow() {
        let mut flow = Flow::new("Demo");
        flow.append_step(Step::new("Name?", StepKind::Input)).unwrap();
        let step_id = flow.steps[0].id.clone();
        flow.step_mut(&step_id).unwrap().settle("Ada");

        let view = FlowView::from(&flow);
        assert_eq!(view.id, flow.id.0);
        assert_eq!(view.title, "Demo");
        assert_eq!(view.steps.len(), 1);
        assert_eq!(view.steps[0].status, StepStatus::Done);
        assert_eq!(view.steps[0].value.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_step_view_omits_absent_fields() {
        let step = Step::new("Name?", StepKind::Input);
        let view = StepView::from(&step);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("value").is_none());
        assert!(json.get("aborted_reason").is_none());
    }
}
