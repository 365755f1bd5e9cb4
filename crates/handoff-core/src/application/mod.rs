//! Application layer: the flow engine and the workflow-facing handle

/// Flow lifecycle, suspension, resolution, and deadline delivery
pub mod engine;

/// Per-flow handle handed to workflow code
pub mod handle;
