//! HTTP routes: workflow registration, manual execution, and webhook ingress.
//!
//! Webhook handlers normalize the provider body, hand the event to the
//! execution dispatcher, and return immediately; execution proceeds in the
//! background and reports through the status channel.

use crate::error::ApiError;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tributary_core::WorkflowId;
use tributary_engine::{GoogleFormEvent, StripeEvent, TriggerEvent, Workflow, WorkflowStore};

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/workflows", post(register_workflow))
        .route("/workflows/{id}/execute", post(execute_workflow))
        .route("/webhooks/stripe", post(stripe_webhook))
        .route("/webhooks/google-form", post(google_form_webhook))
        .with_state(state)
}

/// Query parameters for webhook ingress.
#[derive(Debug, Deserialize)]
struct WebhookParams {
    #[serde(rename = "workflowId")]
    workflow_id: Option<String>,
}

impl WebhookParams {
    /// Extracts and parses the required `workflowId` parameter.
    fn workflow_id(&self) -> Result<WorkflowId, ApiError> {
        let raw = self
            .workflow_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(ApiError::MissingWorkflowId)?;

        raw.parse().map_err(|_| ApiError::InvalidWorkflowId {
            id: raw.to_string(),
        })
    }
}

/// Parses a request body that must be JSON.
fn parse_json_body(body: &Bytes) -> Result<JsonValue, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError::InvalidBody)
}

/// `POST /workflows`: saves a workflow definition.
///
/// Definitions are saved as-is, including drafts that would fail execution
/// validation; validation happens when a trigger arrives.
async fn register_workflow(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<JsonValue>), ApiError> {
    let mut workflow: Workflow =
        serde_json::from_slice(&body).map_err(|_| ApiError::InvalidBody)?;
    // The graph's index map is skipped during deserialization.
    workflow.graph.rebuild_index_map();

    let workflow_id = workflow.id;
    state
        .dispatcher
        .store()
        .save(workflow)
        .await
        .map_err(|error| {
            tracing::error!(workflow_id = %workflow_id, error = %error, "failed to save workflow");
            ApiError::Internal
        })?;

    tracing::info!(workflow_id = %workflow_id, "registered workflow");
    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "workflowId": workflow_id.to_string()})),
    ))
}

/// `POST /workflows/{id}/execute`: manual trigger.
async fn execute_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<JsonValue>, ApiError> {
    let workflow_id: WorkflowId = id
        .parse()
        .map_err(|_| ApiError::InvalidWorkflowId { id })?;

    let data = if body.is_empty() {
        None
    } else {
        Some(parse_json_body(&body)?)
    };

    let run_id = state
        .dispatcher
        .trigger_execution(workflow_id, TriggerEvent::Manual { data })
        .await?;

    Ok(Json(json!({"success": true, "runId": run_id.to_string()})))
}

/// `POST /webhooks/stripe?workflowId=<id>`: Stripe webhook ingress.
async fn stripe_webhook(
    State(state): State<AppState>,
    Query(params): Query<WebhookParams>,
    body: Bytes,
) -> Result<Json<JsonValue>, ApiError> {
    let workflow_id = params.workflow_id()?;
    let body = parse_json_body(&body)?;

    let event = TriggerEvent::Stripe(StripeEvent::from_webhook(&body));
    state
        .dispatcher
        .trigger_execution(workflow_id, event)
        .await?;

    Ok(Json(json!({"success": true})))
}

/// `POST /webhooks/google-form?workflowId=<id>`: Google Form webhook
/// ingress.
async fn google_form_webhook(
    State(state): State<AppState>,
    Query(params): Query<WebhookParams>,
    body: Bytes,
) -> Result<Json<JsonValue>, ApiError> {
    let workflow_id = params.workflow_id()?;
    let body = parse_json_body(&body)?;

    let event = TriggerEvent::GoogleForm(GoogleFormEvent::from_webhook(&body));
    state
        .dispatcher
        .trigger_execution(workflow_id, event)
        .await?;

    Ok(Json(json!({"success": true})))
}
