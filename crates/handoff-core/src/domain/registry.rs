//! Flow registry: the process-wide mapping from flow id to flow.
//!
//! This is the single source of truth consulted by both the workflow-code
//! side and the HTTP-callback side. External crates can implement the trait
//! to provide different storage; the in-memory implementation below is the
//! one a single-process deployment uses.

use async_trait::async_trait;
use dashmap::DashMap;

use super::flow::{Flow, FlowId, StepId};
use crate::EngineError;

/// A one-shot mutation applied to a flow while the registry holds the entry
/// exclusively. Returns the ids of steps the mutation transitioned, so the
/// caller knows which pending waiters to complete.
pub type FlowMutator = Box<dyn FnOnce(&mut Flow) -> Result<Vec<StepId>, EngineError> + Send>;

/// Registry of flows, keyed by flow id.
///
/// Entries are created once, updated in place, and never removed; there is
/// no eviction policy for completed or aborted flows.
#[async_trait]
pub trait FlowRegistry: Send + Sync {
    /// Insert a newly created flow. Fails with `DuplicateFlow` if the id is
    /// already present; a silent overwrite would orphan pending waiters.
    async fn create(&self, flow: Flow) -> Result<(), EngineError>;

    /// Find a flow by id
    async fn find_by_id(&self, id: &FlowId) -> Result<Option<Flow>, EngineError>;

    /// Snapshot all flows, oldest first
    async fn list(&self) -> Result<Vec<Flow>, EngineError>;

    /// Apply a mutation to a flow and return the updated snapshot plus the
    /// step ids the mutation transitioned.
    ///
    /// The mutator runs while the entry is held exclusively, so a status
    /// check inside it is atomic with respect to concurrent settle and
    /// cancel attempts on the same flow.
    async fn update(
        &self,
        id: &FlowId,
        mutate: FlowMutator,
    ) -> Result<(Flow, Vec<StepId>), EngineError>;
}

/// In-memory registry backed by a concurrent map
pub struct MemoryFlowRegistry {
    flows: DashMap<String, Flow>,
}

impl MemoryFlowRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            flows: DashMap::with_capacity(64),
        }
    }
}

impl Default for MemoryFlowRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlowRegistry for MemoryFlowRegistry {
    async fn create(&self, flow: Flow) -> Result<(), EngineError> {
        match self.flows.entry(flow.id.0.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(EngineError::DuplicateFlow(flow.id.0.clone()))
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(flow);
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: &FlowId) -> Result<Option<Flow>, EngineError> {
        Ok(self.flows.get(&id.0).map(|entry| entry.clone()))
    }

    async fn list(&self) -> Result<Vec<Flow>, EngineError> {
        let mut flows: Vec<Flow> = self.flows.iter().map(|entry| entry.clone()).collect();
        flows.sort_by_key(|flow| flow.created_at);
        Ok(flows)
    }

    async fn update(
        &self,
        id: &FlowId,
        mutate: FlowMutator,
    ) -> Result<(Flow, Vec<StepId>), EngineError> {
        let mut entry = self
            .flows
            .get_mut(&id.0)
            .ok_or_else(|| EngineError::FlowNotFound(id.0.clone()))?;

        let touched = mutate(entry.value_mut())?;
        Ok((entry.clone(), touched))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::flow::{Step, StepKind, StepStatus};

    #[tokio::test]
    async fn test_create_and_find() {
        let registry = MemoryFlowRegistry::new();
        let flow = Flow::new("Demo");
        let id = flow.id.clone();

        registry.create(flow).await.unwrap();

        let found = registry.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.title, "Demo");

        let missing = registry
            .find_by_id(&FlowId("nope".to_string()))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_rejected() {
        let registry = MemoryFlowRegistry::new();
        let flow = Flow::new("Demo");
        let copy = flow.clone();

        registry.create(flow).await.unwrap();
        let result = registry.create(copy).await;
        assert!(matches!(result, Err(EngineError::DuplicateFlow(_))));
    }

    #[tokio::test]
    async fn test_update_mutates_in_place() {
        let registry = MemoryFlowRegistry::new();
        let flow = Flow::new("Demo");
        let id = flow.id.clone();
        registry.create(flow).await.unwrap();

        let (updated, touched) = registry
            .update(
                &id,
                Box::new(|flow| {
                    let step = Step::new("Name?", StepKind::Input);
                    let step_id = step.id.clone();
                    flow.append_step(step)?;
                    Ok(vec![step_id])
                }),
            )
            .await
            .unwrap();

        assert_eq!(updated.steps.len(), 1);
        assert_eq!(touched.len(), 1);
        assert_eq!(updated.steps[0].id, touched[0]);

        let found = registry.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.steps.len(), 1);
        assert_eq!(found.steps[0].status, StepStatus::Waiting);
    }

    #[tokio::test]
    async fn test_update_unknown_flow() {
        let registry = MemoryFlowRegistry::new();
        let result = registry
            .update(&FlowId("nope".to_string()), Box::new(|_| Ok(vec![])))
            .await;
        assert!(matches!(result, Err(EngineError::FlowNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_is_oldest_first() {
        let registry = MemoryFlowRegistry::new();
        let first = Flow::new("First");
        let first_id = first.id.clone();
        registry.create(first).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let second = Flow::new("Second");
        registry.create(second).await.unwrap();

        let flows = registry.list().await.unwrap();
        assert_eq!(flows.len(), 2);
        assert_eq!(flows[0].id, first_id);
    }
}
