//! Handoff Server: the HTTP callback surface for the Handoff workflow
//! engine.
//!
//! The server wires an in-memory engine, exposes flows over HTTP so people
//! can answer pending steps, and hosts the workflow tasks that drive flows
//! from the inside.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use handoff_core::{
    EngineError, FlowEngine, MemoryFlowRegistry, MemoryTimerScheduler, TracingEventHandler,
};

/// API routes and handlers
pub mod api;

/// Configuration
pub mod config;

/// Error types
pub mod error;

/// Server aggregate and wire views
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::HandoffServer;

/// How long the demo onboarding flow waits for answers before aborting
const DEMO_FLOW_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Run the server until shutdown.
///
/// Wires the in-memory engine, starts deadline delivery, launches the demo
/// workflow, and serves the HTTP surface on the configured address.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let (scheduler, expiry_rx) = MemoryTimerScheduler::new();
    let engine = Arc::new(FlowEngine::new(
        Arc::new(MemoryFlowRegistry::new()),
        Arc::new(scheduler),
        Arc::new(TracingEventHandler),
        config.endpoint_url(),
    ));
    FlowEngine::start_timeout_delivery(&engine, expiry_rx);

    spawn_demo_workflow(&engine);

    let listen_address = config.listen_address();
    let server = Arc::new(HandoffServer::new(config, Arc::clone(&engine)));
    let app = api::build_router(server).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&listen_address)
        .await
        .with_context(|| format!("Failed to bind {}", listen_address))?;

    info!("Listening on {}", listen_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

/// Launch the demo onboarding workflow: ask for a name and an email, then
/// end the flow. Shows the suspend-until-answered pattern end to end.
fn spawn_demo_workflow(engine: &Arc<FlowEngine>) {
    let engine = Arc::clone(engine);
    tokio::spawn(async move {
        let handle = match FlowEngine::start_flow(&engine, "Employee onboarding", DEMO_FLOW_TIMEOUT).await
        {
            Ok(handle) => handle,
            Err(err) => {
                error!(error = %err, "failed to start demo flow");
                return;
            }
        };

        info!("Demo flow waiting for input at {}", handle.url());

        let outcome = async {
            let name = handle.input("What is the new hire's name?").await?;
            let email = handle.input("What is their email address?").await?;
            info!(%name, %email, "onboarding details collected");
            handle.end().await
        }
        .await;

        match outcome {
            Ok(()) => info!(flow = %handle.flow_id(), "demo flow finished"),
            Err(EngineError::Aborted(reason)) => {
                warn!(flow = %handle.flow_id(), %reason, "demo flow aborted")
            }
            Err(err) => error!(flow = %handle.flow_id(), error = %err, "demo flow failed"),
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install shutdown signal handler");
        return;
    }
    info!("Shutdown signal received");
}
