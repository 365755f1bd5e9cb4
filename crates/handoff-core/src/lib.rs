//! Handoff Core: a human-in-the-loop workflow engine.
//!
//! Workflow code starts a [`Flow`], requests input steps through a
//! [`FlowHandle`], and suspends until a person answers each step over the
//! HTTP surface or the flow's completion deadline aborts it. Every step is
//! settled or aborted exactly once, no matter how submissions and
//! deadlines race.
//!
//! The crate provides:
//!
//! - Domain model: [`Flow`] and [`Step`] aggregates with monotonic status
//!   state machines
//! - [`FlowRegistry`] with an in-memory implementation
//! - [`FlowEngine`]: the suspension/resolution/timeout protocol
//! - [`TimerScheduler`] with an in-memory polling implementation
//! - Domain events describing the flow lifecycle

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Application layer
pub mod application;

/// Domain model
pub mod domain;

/// Error types
pub mod error;

/// Settle-once step waiter table
pub mod suspend;

pub use application::engine::{FlowEngine, TIMEOUT_REASON};
pub use application::handle::FlowHandle;
pub use domain::events::{DomainEvent, DomainEventHandler, TracingEventHandler};
pub use domain::flow::{Flow, FlowId, FlowStatus, Step, StepId, StepKind, StepStatus};
pub use domain::registry::{FlowMutator, FlowRegistry, MemoryFlowRegistry};
pub use domain::timer::{MemoryTimerScheduler, TimerScheduler};
pub use error::EngineError;
pub use suspend::{StepOutcome, StepWaiters};
