//! Health check endpoint for the Handoff server

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::server::HandoffServer;

/// Health check handler.
///
/// Reports the server version and how many flows the engine currently
/// tracks. The registry lookup doubles as a liveness probe of the engine.
pub async fn health_check(State(server): State<Arc<HandoffServer>>) -> impl IntoResponse {
    debug!("Health check requested");

    let flows = match server.engine.list_flows().await {
        Ok(flows) => flows.len(),
        Err(_) => 0,
    };

    Json(json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION"),
        "flows": flows,
    }))
}
