//! API module for the Handoff server
//!
//! This module contains the HTTP routes and handlers: the flow listing,
//! flow and step rendering, and the submission endpoint that resolves
//! pending steps.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use handoff_core::{EngineError, FlowId, StepId};

pub mod errors;
pub mod health;

use crate::server::{FlowSummary, FlowView, HandoffServer, StepView};
use errors::ApiError;

/// Build the router for all endpoints
pub fn build_router(server: Arc<HandoffServer>) -> Router {
    Router::new()
        // Flow listing and rendering
        .route("/", get(list_flows_handler))
        .route("/flow/:flow_id", get(get_flow_handler))
        .route(
            "/flow/:flow_id/:step_id",
            get(get_step_handler).post(submit_step_handler),
        )
        // Health check
        .route("/health", get(health::health_check))
        // Any other path renders the flow listing
        .fallback(list_flows_handler)
        // Shared state
        .with_state(server)
}

/// Submission body for `POST /flow/:flow_id/:step_id`
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// The answer to the step's prompt
    pub value: Option<String>,
}

/// `GET /` (and any unmatched path) - list all flows, oldest first
async fn list_flows_handler(
    State(server): State<Arc<HandoffServer>>,
) -> Result<Json<Vec<FlowSummary>>, ApiError> {
    let flows = server.engine.list_flows().await?;
    let summaries = flows
        .iter()
        .map(|flow| FlowSummary::new(flow, &server.engine))
        .collect();
    Ok(Json(summaries))
}

/// `GET /flow/:flow_id` - render one flow with all its steps.
///
/// An unknown flow id redirects to the listing rather than erroring; stale
/// links land somewhere useful.
async fn get_flow_handler(
    State(server): State<Arc<HandoffServer>>,
    Path(flow_id): Path<String>,
) -> Response {
    match server.engine.render_flow(&FlowId(flow_id)).await {
        Ok(flow) => Json(FlowView::from(&flow)).into_response(),
        Err(EngineError::FlowNotFound(id)) => {
            debug!(flow = %id, "unknown flow rendered, redirecting to listing");
            Redirect::to("/").into_response()
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// `GET /flow/:flow_id/:step_id` - render a single step.
///
/// Same redirect-on-unknown-flow behavior as the flow page; an unknown
/// step within a known flow is a 404.
async fn get_step_handler(
    State(server): State<Arc<HandoffServer>>,
    Path((flow_id, step_id)): Path<(String, String)>,
) -> Response {
    match server
        .engine
        .render_step(&FlowId(flow_id), &StepId(step_id))
        .await
    {
        Ok(step) => Json(StepView::from(&step)).into_response(),
        Err(EngineError::FlowNotFound(id)) => {
            debug!(flow = %id, "unknown flow rendered, redirecting to listing");
            Redirect::to("/").into_response()
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// `POST /flow/:flow_id/:step_id` - submit the answer for a pending step.
///
/// A malformed body or an empty value is rejected with 400 before the
/// engine sees it. Submissions against settled steps are absorbed by the
/// engine; the response carries the flow as it stands either way.
async fn submit_step_handler(
    State(server): State<Arc<HandoffServer>>,
    Path((flow_id, step_id)): Path<(String, String)>,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<FlowView>, ApiError> {
    let Json(request) = body
        .map_err(|rejection| ApiError::invalid_submission(format!("Invalid request body: {}", rejection)))?;

    let value = request.value.unwrap_or_default();
    if value.trim().is_empty() {
        return Err(ApiError::invalid_submission(
            "Submission value must not be empty",
        ));
    }

    let flow_id = FlowId(flow_id);
    let step_id = StepId(step_id);

    let flow = server.engine.submit(&flow_id, &step_id, &value).await?;

    info!(flow = %flow_id, step = %step_id, "submission accepted");
    Ok(Json(FlowView::from(&flow)))
}
