//! The settle-once primitive coupling a pending step to its waiting
//! workflow code.
//!
//! Each pending step owns exactly one oneshot sender, stored here until
//! either the resolution path (an HTTP submission) or the abort path (the
//! deadline) claims it. A sender can be claimed at most once, and the
//! claim only happens after the claimant won the step's terminality
//! check inside [`FlowRegistry::update`](crate::FlowRegistry::update) —
//! together those two facts give the exactly-once settle/abort guarantee.

use dashmap::DashMap;
use tokio::sync::oneshot;

use crate::domain::flow::{FlowId, StepId};

/// The terminal outcome delivered to waiting workflow code: the submitted
/// value on settle, or the abort reason (e.g. `"Timeout"`) on cancel.
pub type StepOutcome = Result<String, String>;

/// Table of pending step waiters, keyed by flow and step id
pub struct StepWaiters {
    waiters: DashMap<String, oneshot::Sender<StepOutcome>>,
}

impl StepWaiters {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            waiters: DashMap::new(),
        }
    }

    fn key(flow_id: &FlowId, step_id: &StepId) -> String {
        format!("{}:{}", flow_id.0, step_id.0)
    }

    /// Register a waiter for a step and return the receiver workflow code
    /// awaits. Called before the step is appended to its flow, so a sender
    /// exists for every step the HTTP surface can see.
    pub fn register(&self, flow_id: &FlowId, step_id: &StepId) -> oneshot::Receiver<StepOutcome> {
        let (tx, rx) = oneshot::channel();
        self.waiters.insert(Self::key(flow_id, step_id), tx);
        rx
    }

    /// Claim the sender for a step. Returns `None` if it was already
    /// claimed (or never existed); at most one caller ever gets it.
    pub fn claim(
        &self,
        flow_id: &FlowId,
        step_id: &StepId,
    ) -> Option<oneshot::Sender<StepOutcome>> {
        self.waiters
            .remove(&Self::key(flow_id, step_id))
            .map(|(_, tx)| tx)
    }

    /// Drop the waiter for a step without completing it; used to unwind
    /// when appending the step to its flow failed.
    pub fn discard(&self, flow_id: &FlowId, step_id: &StepId) {
        self.waiters.remove(&Self::key(flow_id, step_id));
    }

    /// Number of registered waiters
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    /// Whether no waiters are registered
    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}

impl Default for StepWaiters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_claim() {
        let waiters = StepWaiters::new();
        let flow_id = FlowId("flow1".to_string());
        let step_id = StepId("step1".to_string());

        let rx = waiters.register(&flow_id, &step_id);
        assert_eq!(waiters.len(), 1);

        let tx = waiters.claim(&flow_id, &step_id).expect("claim failed");
        tx.send(Ok("Ada".to_string())).unwrap();

        assert_eq!(rx.await.unwrap(), Ok("Ada".to_string()));
        assert!(waiters.is_empty());
    }

    #[tokio::test]
    async fn test_claim_is_exactly_once() {
        let waiters = StepWaiters::new();
        let flow_id = FlowId("flow1".to_string());
        let step_id = StepId("step1".to_string());

        let _rx = waiters.register(&flow_id, &step_id);

        assert!(waiters.claim(&flow_id, &step_id).is_some());
        assert!(waiters.claim(&flow_id, &step_id).is_none());
    }

    #[tokio::test]
    async fn test_claim_unknown_step() {
        let waiters = StepWaiters::new();
        let flow_id = FlowId("flow1".to_string());
        let step_id = StepId("step1".to_string());

        assert!(waiters.claim(&flow_id, &step_id).is_none());
    }

    #[tokio::test]
    async fn test_discard_drops_receiver() {
        let waiters = StepWaiters::new();
        let flow_id = FlowId("flow1".to_string());
        let step_id = StepId("step1".to_string());

        let rx = waiters.register(&flow_id, &step_id);
        waiters.discard(&flow_id, &step_id);

        // The sender side is gone; the receiver observes the drop
        assert!(rx.await.is_err());
    }
}
