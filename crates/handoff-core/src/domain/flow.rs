use crate::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Value object: Flow ID
///
/// Opaque unique string addressing one flow; embedded in callback URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowId(pub String);

impl FlowId {
    /// Generate a fresh flow id
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for FlowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value object: Step ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(pub String);

impl StepId {
    /// Generate a fresh step id
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Flow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowStatus {
    /// Flow created, no steps requested yet
    NotStarted,

    /// Flow has at least one step and has not ended
    InProgress,

    /// Workflow code explicitly ended the flow
    Done,

    /// The completion deadline expired with work outstanding
    Aborted,
}

impl FlowStatus {
    /// Terminal statuses never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowStatus::Done | FlowStatus::Aborted)
    }
}

/// Step status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    /// Created, not yet shown to anyone
    Waiting,

    /// Rendered at least once; an answer is expected
    InProgress,

    /// Answered with a value
    Done,

    /// Cancelled without an answer
    Aborted,
}

impl StepStatus {
    /// Terminal statuses never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Done | StepStatus::Aborted)
    }
}

/// Discriminator for the kind of external request a step represents.
///
/// Only single-value text input exists today; the tag is open so other
/// suspend/resume request kinds can be added without breaking stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum StepKind {
    /// A single-value text input request
    Input,
}

/// A single suspended request for external input; the unit of
/// suspension and resumption within a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Unique identifier, assigned at creation
    pub id: StepId,

    /// Human-readable prompt shown to whoever answers
    pub label: String,

    /// Request kind
    pub kind: StepKind,

    /// Current status
    pub status: StepStatus,

    /// The submitted answer, present once the step is done
    pub value: Option<String>,

    /// Why the step was aborted, present once the step is aborted
    pub aborted_reason: Option<String>,
}

impl Step {
    /// Create a new step in `Waiting` status
    pub fn new(label: impl Into<String>, kind: StepKind) -> Self {
        Self {
            id: StepId::new(),
            label: label.into(),
            kind,
            status: StepStatus::Waiting,
            value: None,
            aborted_reason: None,
        }
    }

    /// Record the answer value and move to `Done`.
    ///
    /// Returns whether the transition took effect. Terminal steps absorb
    /// the call as a no-op: the stored value is never overwritten.
    pub fn settle(&mut self, value: impl Into<String>) -> bool {
        match self.status {
            StepStatus::Waiting | StepStatus::InProgress => {
                self.status = StepStatus::Done;
                self.value = Some(value.into());
                true
            }
            StepStatus::Done | StepStatus::Aborted => false,
        }
    }

    /// Cancel the step without an answer and move to `Aborted`.
    ///
    /// Same terminality contract as [`Step::settle`].
    pub fn abort(&mut self, reason: impl Into<String>) -> bool {
        match self.status {
            StepStatus::Waiting | StepStatus::InProgress => {
                self.status = StepStatus::Aborted;
                self.aborted_reason = Some(reason.into());
                true
            }
            StepStatus::Done | StepStatus::Aborted => false,
        }
    }

    /// Mark the step as observed (first render), `Waiting` -> `InProgress`.
    pub fn observe(&mut self) -> bool {
        if self.status == StepStatus::Waiting {
            self.status = StepStatus::InProgress;
            true
        } else {
            false
        }
    }

    /// Whether the step still awaits an answer
    pub fn is_pending(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Aggregate: one workflow instance, owning an ordered sequence of steps
/// and an overall status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    /// Unique identifier; primary key in the registry
    pub id: FlowId,

    /// Descriptive title, immutable after creation
    pub title: String,

    /// Current status
    pub status: FlowStatus,

    /// Steps in the order workflow code requested them; append-only
    pub steps: Vec<Step>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Flow {
    /// Create a new flow in `NotStarted` status with no steps
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: FlowId::new(),
            title: title.into(),
            status: FlowStatus::NotStarted,
            steps: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Append a step requested by workflow code.
    ///
    /// The first step moves the flow from `NotStarted` to `InProgress`.
    /// Steps cannot be added to a terminal flow.
    pub fn append_step(&mut self, step: Step) -> Result<(), EngineError> {
        if self.status.is_terminal() {
            return Err(EngineError::FlowTerminated(self.id.0.clone()));
        }
        if self.status == FlowStatus::NotStarted {
            self.status = FlowStatus::InProgress;
        }
        self.steps.push(step);
        self.touch();
        Ok(())
    }

    /// Find a step by id
    pub fn step(&self, step_id: &StepId) -> Option<&Step> {
        self.steps.iter().find(|s| &s.id == step_id)
    }

    /// Find a step by id, mutably
    pub fn step_mut(&mut self, step_id: &StepId) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| &s.id == step_id)
    }

    /// The first step still in `Waiting`, in request order
    pub fn first_waiting_step(&self) -> Option<&Step> {
        self.steps.iter().find(|s| s.status == StepStatus::Waiting)
    }

    /// The first step still in `Waiting`, mutably
    pub fn first_waiting_step_mut(&mut self) -> Option<&mut Step> {
        self.steps
            .iter_mut()
            .find(|s| s.status == StepStatus::Waiting)
    }

    /// Ids of steps that have not reached a terminal status
    pub fn pending_step_ids(&self) -> Vec<StepId> {
        self.steps
            .iter()
            .filter(|s| s.is_pending())
            .map(|s| s.id.clone())
            .collect()
    }

    /// Whether every step reached `Done`
    pub fn all_steps_done(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Done)
    }

    /// Explicit end-of-flow signal from workflow code
    pub fn end(&mut self) -> Result<(), EngineError> {
        if self.status.is_terminal() {
            return Err(EngineError::FlowTerminated(self.id.0.clone()));
        }
        self.status = FlowStatus::Done;
        self.touch();
        Ok(())
    }

    /// Abort the flow after deadline expiry. No-op on a terminal flow.
    pub fn abort(&mut self) {
        if !self.status.is_terminal() {
            self.status = FlowStatus::Aborted;
            self.touch();
        }
    }

    /// Whether the flow reached a terminal status (done or aborted)
    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }
}
