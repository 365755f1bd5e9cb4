use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::application::handle::FlowHandle;
use crate::domain::events::{
    DomainEvent, DomainEventHandler, FlowAborted, FlowCreated, FlowEnded, StepAborted,
    StepRequested, StepResolved,
};
use crate::domain::flow::{Flow, FlowId, Step, StepId, StepKind};
use crate::domain::registry::FlowRegistry;
use crate::domain::timer::TimerScheduler;
use crate::suspend::StepWaiters;
use crate::EngineError;

/// Abort reason delivered to pending steps when the completion deadline
/// expires.
pub const TIMEOUT_REASON: &str = "Timeout";

/// The flow engine: creates flows, suspends workflow code on input steps,
/// resolves steps from external submissions, and aborts whatever is still
/// pending when a flow's deadline fires.
///
/// Settle and cancel can race for the same step from independent external
/// triggers. Both paths perform their terminality check inside
/// [`FlowRegistry::update`], which holds the flow entry exclusively, so
/// whichever reaches the check first wins and the other becomes a no-op.
/// Only the winner claims the step's oneshot sender from [`StepWaiters`].
pub struct FlowEngine {
    registry: Arc<dyn FlowRegistry>,
    waiters: StepWaiters,
    timers: Arc<dyn TimerScheduler>,
    // Live deadline per flow, flow id -> timer id
    deadlines: DashMap<String, String>,
    events: Arc<dyn DomainEventHandler>,
    endpoint_url: String,
}

impl FlowEngine {
    /// Create a new engine.
    ///
    /// `endpoint_url` is the host-supplied base URL under which flows are
    /// externally reachable; it is only used to surface flow URLs to
    /// operators.
    pub fn new(
        registry: Arc<dyn FlowRegistry>,
        timers: Arc<dyn TimerScheduler>,
        events: Arc<dyn DomainEventHandler>,
        endpoint_url: impl Into<String>,
    ) -> Self {
        let endpoint_url = endpoint_url.into();
        Self {
            registry,
            waiters: StepWaiters::new(),
            timers,
            deadlines: DashMap::new(),
            events,
            endpoint_url: endpoint_url.trim_end_matches('/').to_string(),
        }
    }

    /// The externally reachable URL for a flow
    pub fn flow_url(&self, flow_id: &FlowId) -> String {
        format!("{}/flow/{}", self.endpoint_url, flow_id)
    }

    /// Begin a new flow and schedule its completion deadline.
    ///
    /// Returns the scoped handle workflow code uses for subsequent
    /// `input`/`end` calls.
    pub async fn start_flow(
        engine: &Arc<Self>,
        title: &str,
        timeout: Duration,
    ) -> Result<FlowHandle, EngineError> {
        let flow = Flow::new(title);
        let flow_id = flow.id.clone();
        let flow_title = flow.title.clone();

        engine.registry.create(flow).await?;

        let timer_id = engine.timers.schedule(&flow_id, timeout).await?;
        debug!(flow = %flow_id, timer = %timer_id, ?timeout, "deadline scheduled");
        engine.deadlines.insert(flow_id.0.clone(), timer_id);

        engine
            .emit(Box::new(FlowCreated {
                flow_id: flow_id.clone(),
                title: flow_title,
                timestamp: Utc::now(),
            }))
            .await;

        info!(flow = %flow_id, url = %engine.flow_url(&flow_id), "flow started");

        Ok(FlowHandle::new(Arc::clone(engine), flow_id))
    }

    /// Create an input step on a flow and suspend until it is answered or
    /// aborted.
    ///
    /// The step is visible to the HTTP surface the instant it is appended,
    /// before this method suspends; its waiter is registered even earlier
    /// so no submission window exists in which the step can be seen but
    /// not settled.
    pub async fn request_input(
        &self,
        flow_id: &FlowId,
        label: &str,
    ) -> Result<String, EngineError> {
        let step = Step::new(label, StepKind::Input);
        let step_id = step.id.clone();

        let receiver = self.waiters.register(flow_id, &step_id);

        let appended = self
            .registry
            .update(
                flow_id,
                Box::new(move |flow| {
                    flow.append_step(step)?;
                    Ok(vec![])
                }),
            )
            .await;

        if let Err(err) = appended {
            self.waiters.discard(flow_id, &step_id);
            return Err(match err {
                EngineError::FlowNotFound(id) => EngineError::FlowNotStarted(id),
                other => other,
            });
        }

        self.emit(Box::new(StepRequested {
            flow_id: flow_id.clone(),
            step_id: step_id.clone(),
            label: label.to_string(),
            timestamp: Utc::now(),
        }))
        .await;

        debug!(flow = %flow_id, step = %step_id, label, "waiting for input");

        match receiver.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(reason)) => Err(EngineError::Aborted(reason)),
            Err(_) => Err(EngineError::Other(format!(
                "Step waiter dropped without resolution: {}",
                step_id
            ))),
        }
    }

    /// Resolve a step with a submitted value; the settle path.
    ///
    /// A submission addressed at an unknown or already-terminal step is
    /// absorbed as a no-op so duplicate deliveries cannot double-apply;
    /// the returned snapshot reflects the post-resolution state either
    /// way. An unknown flow is an error.
    pub async fn submit(
        &self,
        flow_id: &FlowId,
        step_id: &StepId,
        value: &str,
    ) -> Result<Flow, EngineError> {
        let (flow, settled) = {
            let step_id = step_id.clone();
            let value = value.to_string();
            self.registry
                .update(
                    flow_id,
                    Box::new(move |flow| {
                        if let Some(step) = flow.step_mut(&step_id) {
                            if step.settle(value) {
                                return Ok(vec![step_id]);
                            }
                        }
                        Ok(vec![])
                    }),
                )
                .await?
        };

        for settled_id in &settled {
            if let Some(sender) = self.waiters.claim(flow_id, settled_id) {
                // The receiver may be gone if the workflow task was dropped
                let _ = sender.send(Ok(value.to_string()));
            }

            self.emit(Box::new(StepResolved {
                flow_id: flow_id.clone(),
                step_id: settled_id.clone(),
                timestamp: Utc::now(),
            }))
            .await;

            info!(flow = %flow_id, step = %settled_id, "step resolved");
        }

        if settled.is_empty() {
            debug!(flow = %flow_id, step = %step_id, "submission ignored: step unknown or already settled");
        }

        Ok(flow)
    }

    /// Deliver deadline expiry to a flow; the abort path.
    ///
    /// Every step not yet done is cancelled with reason `"Timeout"`; if
    /// any step was actually cancelled the flow becomes aborted. A flow
    /// whose steps all finished in time is left untouched, and an unknown
    /// flow id is a no-op.
    pub async fn timeout_fired(&self, flow_id: &FlowId) -> Result<(), EngineError> {
        // The timer has fired; its id is no longer cancellable
        self.deadlines.remove(&flow_id.0);

        let result = self
            .registry
            .update(
                flow_id,
                Box::new(|flow| {
                    let mut cancelled = Vec::new();
                    for step in flow.steps.iter_mut() {
                        if step.abort(TIMEOUT_REASON) {
                            cancelled.push(step.id.clone());
                        }
                    }
                    if !cancelled.is_empty() {
                        flow.abort();
                    }
                    Ok(cancelled)
                }),
            )
            .await;

        let (_, cancelled) = match result {
            Ok(outcome) => outcome,
            Err(EngineError::FlowNotFound(_)) => {
                debug!(flow = %flow_id, "deadline fired for unknown flow");
                return Ok(());
            }
            Err(other) => return Err(other),
        };

        for step_id in &cancelled {
            if let Some(sender) = self.waiters.claim(flow_id, step_id) {
                let _ = sender.send(Err(TIMEOUT_REASON.to_string()));
            }

            self.emit(Box::new(StepAborted {
                flow_id: flow_id.clone(),
                step_id: step_id.clone(),
                reason: TIMEOUT_REASON.to_string(),
                timestamp: Utc::now(),
            }))
            .await;
        }

        if !cancelled.is_empty() {
            warn!(flow = %flow_id, cancelled = cancelled.len(), "flow aborted by deadline");

            self.emit(Box::new(FlowAborted {
                flow_id: flow_id.clone(),
                cancelled_steps: cancelled.len(),
                timestamp: Utc::now(),
            }))
            .await;
        }

        Ok(())
    }

    /// Mark a flow done; the explicit end-of-flow signal.
    ///
    /// Ending a flow with nothing pending cancels its deadline. Ending it
    /// with steps still pending does not retroactively resolve them; the
    /// deadline stays armed so those steps are eventually aborted.
    pub async fn end_flow(&self, flow_id: &FlowId) -> Result<(), EngineError> {
        let (_, pending) = self
            .registry
            .update(
                flow_id,
                Box::new(|flow| {
                    let pending = flow.pending_step_ids();
                    flow.end()?;
                    Ok(pending)
                }),
            )
            .await
            .map_err(|err| match err {
                EngineError::FlowNotFound(id) => EngineError::FlowNotStarted(id),
                other => other,
            })?;

        if pending.is_empty() {
            if let Some((_, timer_id)) = self.deadlines.remove(&flow_id.0) {
                self.timers.cancel(&timer_id).await?;
                debug!(flow = %flow_id, timer = %timer_id, "deadline cancelled");
            }
        } else {
            warn!(flow = %flow_id, pending = pending.len(), "flow ended with steps still pending");
        }

        self.emit(Box::new(FlowEnded {
            flow_id: flow_id.clone(),
            timestamp: Utc::now(),
        }))
        .await;

        info!(flow = %flow_id, "flow done");
        Ok(())
    }

    /// Snapshot a flow for rendering.
    ///
    /// Rendering is an observation: the first waiting step, if any, moves
    /// to in-progress.
    pub async fn render_flow(&self, flow_id: &FlowId) -> Result<Flow, EngineError> {
        let (flow, observed) = self
            .registry
            .update(
                flow_id,
                Box::new(|flow| {
                    if let Some(step) = flow.first_waiting_step_mut() {
                        if step.observe() {
                            return Ok(vec![step.id.clone()]);
                        }
                    }
                    Ok(vec![])
                }),
            )
            .await?;

        for step_id in observed {
            debug!(flow = %flow_id, step = %step_id, "step observed");
        }

        Ok(flow)
    }

    /// Snapshot a single step for rendering, with the same observation
    /// semantics as [`FlowEngine::render_flow`].
    pub async fn render_step(
        &self,
        flow_id: &FlowId,
        step_id: &StepId,
    ) -> Result<Step, EngineError> {
        let (flow, _) = {
            let step_id = step_id.clone();
            self.registry
                .update(
                    flow_id,
                    Box::new(move |flow| match flow.step_mut(&step_id) {
                        None => Err(EngineError::StepNotFound(step_id.0.clone())),
                        Some(step) => {
                            step.observe();
                            Ok(vec![])
                        }
                    }),
                )
                .await?
        };

        flow.step(step_id)
            .cloned()
            .ok_or_else(|| EngineError::StepNotFound(step_id.0.clone()))
    }

    /// Snapshot all known flows, oldest first
    pub async fn list_flows(&self) -> Result<Vec<Flow>, EngineError> {
        self.registry.list().await
    }

    /// Spawn the task that drains timer expirations and delivers each one
    /// as a `timeout_fired` call.
    pub fn start_timeout_delivery(engine: &Arc<Self>, mut expirations: mpsc::Receiver<FlowId>) {
        let engine = Arc::clone(engine);
        tokio::spawn(async move {
            while let Some(flow_id) = expirations.recv().await {
                if let Err(err) = engine.timeout_fired(&flow_id).await {
                    error!(flow = %flow_id, error = %err, "timeout delivery failed");
                }
            }
        });
    }

    async fn emit(&self, event: Box<dyn DomainEvent>) {
        if let Err(err) = self.events.handle_event(event).await {
            warn!(error = %err, "domain event handler failed");
        }
    }
}
