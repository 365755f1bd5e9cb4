use super::flow::{FlowId, StepId};
use crate::EngineError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Domain event trait for all events in the system
pub trait DomainEvent: Debug + Send + Sync {
    /// Returns the type of the event as a string
    fn event_type(&self) -> &'static str;

    /// Returns the flow ID this event is associated with
    fn flow_id(&self) -> &FlowId;

    /// Returns the timestamp when the event occurred
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Handler for domain events emitted by the engine
#[async_trait]
pub trait DomainEventHandler: Send + Sync {
    /// Handle a single event
    async fn handle_event(&self, event: Box<dyn DomainEvent>) -> Result<(), EngineError>;
}

/// Event: flow created
#[derive(Debug)]
pub struct FlowCreated {
    /// The flow that was created
    pub flow_id: FlowId,

    /// The flow title
    pub title: String,

    /// When the flow was created
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for FlowCreated {
    fn event_type(&self) -> &'static str {
        "flow.created"
    }

    fn flow_id(&self) -> &FlowId {
        &self.flow_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: workflow code requested a piece of input
#[derive(Debug)]
pub struct StepRequested {
    /// The owning flow
    pub flow_id: FlowId,

    /// The step that was appended
    pub step_id: StepId,

    /// The prompt label
    pub label: String,

    /// When the step was requested
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for StepRequested {
    fn event_type(&self) -> &'static str {
        "step.requested"
    }

    fn flow_id(&self) -> &FlowId {
        &self.flow_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: a pending step received its answer
#[derive(Debug)]
pub struct StepResolved {
    /// The owning flow
    pub flow_id: FlowId,

    /// The step that was answered
    pub step_id: StepId,

    /// When the answer arrived
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for StepResolved {
    fn event_type(&self) -> &'static str {
        "step.resolved"
    }

    fn flow_id(&self) -> &FlowId {
        &self.flow_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: a pending step was cancelled without an answer
#[derive(Debug)]
pub struct StepAborted {
    /// The owning flow
    pub flow_id: FlowId,

    /// The step that was cancelled
    pub step_id: StepId,

    /// The abort reason delivered to the waiting workflow code
    pub reason: String,

    /// When the step was cancelled
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for StepAborted {
    fn event_type(&self) -> &'static str {
        "step.aborted"
    }

    fn flow_id(&self) -> &FlowId {
        &self.flow_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: workflow code ended the flow
#[derive(Debug)]
pub struct FlowEnded {
    /// The flow that ended
    pub flow_id: FlowId,

    /// When the flow ended
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for FlowEnded {
    fn event_type(&self) -> &'static str {
        "flow.ended"
    }

    fn flow_id(&self) -> &FlowId {
        &self.flow_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: the completion deadline expired with steps outstanding
#[derive(Debug)]
pub struct FlowAborted {
    /// The flow that was aborted
    pub flow_id: FlowId,

    /// How many steps were cancelled by the deadline pass
    pub cancelled_steps: usize,

    /// When the deadline fired
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for FlowAborted {
    fn event_type(&self) -> &'static str {
        "flow.aborted"
    }

    fn flow_id(&self) -> &FlowId {
        &self.flow_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event handler that records events on the tracing subscriber
pub struct TracingEventHandler;

#[async_trait]
impl DomainEventHandler for TracingEventHandler {
    async fn handle_event(&self, event: Box<dyn DomainEvent>) -> Result<(), EngineError> {
        tracing::info!(
            event = event.event_type(),
            flow = %event.flow_id(),
            "domain event"
        );
        Ok(())
    }
}
