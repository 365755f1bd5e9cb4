//! Domain layer: flow and step models, registry, events, and deadlines

/// Flow and step aggregates with their status state machines
pub mod flow;

/// Process-wide flow registry
pub mod registry;

/// Domain events emitted by the engine
pub mod events;

/// Deadline scheduling
pub mod timer;
