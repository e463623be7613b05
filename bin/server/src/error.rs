//! API error types for the ingress server.
//!
//! Every error renders as a structured JSON body with an explicit
//! success/error flag and an HTTP status matching the category: 400 for
//! caller input errors, 404/409/422 for workflow-state problems, 500 for
//! internal failures (with details logged, never returned).

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt;
use tributary_engine::{DispatchError, StoreError};

/// Errors returned by the HTTP API.
#[derive(Debug)]
pub enum ApiError {
    /// The `workflowId` query parameter was missing.
    MissingWorkflowId,
    /// The `workflowId` value did not parse.
    InvalidWorkflowId { id: String },
    /// The request body was not valid JSON.
    InvalidBody,
    /// No workflow with the given ID exists.
    WorkflowNotFound,
    /// The workflow is disabled and refuses triggers.
    WorkflowDisabled,
    /// The workflow graph cannot be executed.
    InvalidWorkflow { reason: String },
    /// Anything unexpected; details are logged, not returned.
    Internal,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingWorkflowId => {
                write!(f, "missing required query parameter: workflowId")
            }
            Self::InvalidWorkflowId { id } => write!(f, "invalid workflowId '{id}'"),
            Self::InvalidBody => write!(f, "request body must be valid JSON"),
            Self::WorkflowNotFound => write!(f, "workflow not found"),
            Self::WorkflowDisabled => write!(f, "workflow is disabled"),
            Self::InvalidWorkflow { reason } => write!(f, "invalid workflow: {reason}"),
            Self::Internal => write!(f, "internal server error"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<DispatchError> for ApiError {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::Store(StoreError::NotFound { .. }) => Self::WorkflowNotFound,
            DispatchError::Store(StoreError::Backend { message }) => {
                tracing::error!(error = %message, "workflow store failure");
                Self::Internal
            }
            DispatchError::Disabled { .. } => Self::WorkflowDisabled,
            DispatchError::InvalidGraph(e) => Self::InvalidWorkflow {
                reason: e.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingWorkflowId => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "Missing required query parameter: workflowId",
                })),
            )
                .into_response(),
            Self::InvalidWorkflowId { .. } => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "Invalid workflowId query parameter",
                })),
            )
                .into_response(),
            Self::InvalidBody => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "Request body must be valid JSON",
                })),
            )
                .into_response(),
            Self::WorkflowNotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "success": false,
                    "error": "Workflow not found",
                })),
            )
                .into_response(),
            Self::WorkflowDisabled => (
                StatusCode::CONFLICT,
                Json(json!({
                    "success": false,
                    "error": "Workflow is disabled",
                })),
            )
                .into_response(),
            Self::InvalidWorkflow { reason } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "success": false,
                    "error": format!("Invalid workflow: {reason}"),
                })),
            )
                .into_response(),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error",
                })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tributary_core::WorkflowId;

    #[test]
    fn dispatch_errors_map_to_api_errors() {
        let workflow_id = WorkflowId::new();

        let not_found = ApiError::from(DispatchError::Store(StoreError::NotFound { workflow_id }));
        assert!(matches!(not_found, ApiError::WorkflowNotFound));

        let disabled = ApiError::from(DispatchError::Disabled { workflow_id });
        assert!(matches!(disabled, ApiError::WorkflowDisabled));
    }

    #[test]
    fn internal_error_hides_details() {
        let err = ApiError::from(DispatchError::Store(StoreError::Backend {
            message: "secret connection string".to_string(),
        }));
        assert!(matches!(err, ApiError::Internal));
        assert_eq!(err.to_string(), "internal server error");
    }
}
