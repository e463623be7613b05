//! Node execution dispatch.
//!
//! The `NodeExecutor` trait is the seam between the graph walker and the
//! per-type executors, which lets the walker be tested with scripted doubles.
//! `DefaultExecutor` is the production implementation: an exhaustive match
//! over the closed node-type set, so adding a node type is a compile error
//! until every arm is handled.

use crate::context::ExecutionContext;
use crate::error::ExecutorError;
use crate::http_request::HttpRequestExecutor;
use crate::node::{Node, NodeConfig};
use async_trait::async_trait;

/// Executes a single node against the context built by its dependencies.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// Runs the node and returns the updated context.
    ///
    /// The returned context must equal the input context plus the node's own
    /// output bindings; executors never remove upstream state.
    async fn execute(
        &self,
        node: &Node,
        context: ExecutionContext,
    ) -> Result<ExecutionContext, ExecutorError>;
}

/// The production executor for the built-in node types.
#[derive(Debug, Clone, Default)]
pub struct DefaultExecutor {
    http: HttpRequestExecutor,
}

impl DefaultExecutor {
    /// Creates an executor with default HTTP client and retry policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an executor with a custom HTTP request executor.
    #[must_use]
    pub fn with_http(http: HttpRequestExecutor) -> Self {
        Self { http }
    }
}

#[async_trait]
impl NodeExecutor for DefaultExecutor {
    async fn execute(
        &self,
        node: &Node,
        context: ExecutionContext,
    ) -> Result<ExecutionContext, ExecutorError> {
        match &node.config {
            // Triggers only seed a run; at execution time they pass the
            // context through unchanged.
            NodeConfig::ManualTrigger
            | NodeConfig::StripeTrigger
            | NodeConfig::GoogleFormTrigger => Ok(context),
            NodeConfig::HttpRequest(config) => self.http.execute(config, context).await,
        }
    }
}

/// An executor that passes the context through for every node type.
///
/// Useful for dry runs and tests that only exercise graph traversal.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughExecutor;

#[async_trait]
impl NodeExecutor for PassthroughExecutor {
    async fn execute(
        &self,
        _node: &Node,
        context: ExecutionContext,
    ) -> Result<ExecutionContext, ExecutorError> {
        Ok(context)
    }
}
