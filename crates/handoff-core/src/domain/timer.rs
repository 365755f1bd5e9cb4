//! Deadline scheduling for flows.
//!
//! A flow gets exactly one completion deadline when it starts. When the
//! deadline expires the scheduler delivers the flow id to whoever consumes
//! the expiry channel; delivering the abort to the flow's steps is the
//! engine's job, not the scheduler's.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use super::flow::FlowId;
use crate::EngineError;

/// Arranges for an abort event to be delivered to a flow after a delay
#[async_trait]
pub trait TimerScheduler: Send + Sync {
    /// Schedule a deadline for the given flow; returns a timer id
    async fn schedule(&self, flow_id: &FlowId, delay: Duration) -> Result<String, EngineError>;

    /// Cancel a previously scheduled deadline
    async fn cancel(&self, timer_id: &str) -> Result<(), EngineError>;
}

type TimerMap = HashMap<String, (Instant, FlowId)>;
type SharedTimerMap = std::sync::Arc<tokio::sync::RwLock<TimerMap>>;

/// In-memory scheduler: an expiry map polled by a background task that
/// sends due flow ids over a channel.
pub struct MemoryTimerScheduler {
    timers: SharedTimerMap,
}

impl MemoryTimerScheduler {
    /// Create a scheduler and the receiver its expirations are sent to
    pub fn new() -> (Self, mpsc::Receiver<FlowId>) {
        let (expiry_tx, expiry_rx) = mpsc::channel(32);

        let scheduler = Self {
            timers: std::sync::Arc::new(tokio::sync::RwLock::new(HashMap::new())),
        };

        let timers_ref = scheduler.timers.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(50)).await;

                let now = Instant::now();
                let mut expired = Vec::new();

                {
                    let timers_map = timers_ref.read().await;
                    for (id, (expire_at, flow_id)) in timers_map.iter() {
                        if *expire_at <= now {
                            expired.push((id.clone(), flow_id.clone()));
                        }
                    }
                }

                if !expired.is_empty() {
                    let mut timers_map = timers_ref.write().await;
                    for (id, flow_id) in expired {
                        timers_map.remove(&id);
                        if expiry_tx.send(flow_id).await.is_err() {
                            // Channel closed, likely shutdown
                            return;
                        }
                    }
                }
            }
        });

        (scheduler, expiry_rx)
    }
}

#[async_trait]
impl TimerScheduler for MemoryTimerScheduler {
    async fn schedule(&self, flow_id: &FlowId, delay: Duration) -> Result<String, EngineError> {
        let timer_id = uuid::Uuid::new_v4().to_string();
        let expires_at = Instant::now() + delay;

        let mut timers = self.timers.write().await;
        timers.insert(timer_id.clone(), (expires_at, flow_id.clone()));

        Ok(timer_id)
    }

    async fn cancel(&self, timer_id: &str) -> Result<(), EngineError> {
        let mut timers = self.timers.write().await;
        timers.remove(timer_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_expired_timer_is_delivered() {
        let (scheduler, mut expiry_rx) = MemoryTimerScheduler::new();
        let flow_id = FlowId("flow1".to_string());

        scheduler
            .schedule(&flow_id, Duration::ZERO)
            .await
            .unwrap();

        let delivered = tokio::time::timeout(Duration::from_secs(1), expiry_rx.recv())
            .await
            .expect("timer was not delivered")
            .unwrap();
        assert_eq!(delivered, flow_id);
    }

    #[tokio::test]
    async fn test_cancelled_timer_is_not_delivered() {
        let (scheduler, mut expiry_rx) = MemoryTimerScheduler::new();
        let flow_id = FlowId("flow1".to_string());

        let timer_id = scheduler
            .schedule(&flow_id, Duration::from_millis(100))
            .await
            .unwrap();
        scheduler.cancel(&timer_id).await.unwrap();

        let result =
            tokio::time::timeout(Duration::from_millis(300), expiry_rx.recv()).await;
        assert!(result.is_err(), "cancelled timer still fired");
    }

    #[tokio::test]
    async fn test_future_timer_does_not_fire_early() {
        let (scheduler, mut expiry_rx) = MemoryTimerScheduler::new();
        let flow_id = FlowId("flow1".to_string());

        scheduler
            .schedule(&flow_id, Duration::from_secs(60))
            .await
            .unwrap();

        let result =
            tokio::time::timeout(Duration::from_millis(200), expiry_rx.recv()).await;
        assert!(result.is_err(), "timer fired before its deadline");
    }
}
