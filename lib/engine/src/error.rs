//! Error types for the workflow engine.
//!
//! The taxonomy distinguishes failures that retrying cannot fix (invalid
//! static configuration, cyclic graphs) from transient side-effect failures
//! that the step runner may retry:
//! - `GraphError`: structural problems with a workflow graph
//! - `ExecutorError`: failures from a single node invocation
//! - `ExecutionError`: run-level failures from the graph walker

use crate::node::NodeId;
use std::fmt;

/// Errors from graph operations and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Node with the given ID was not found in the graph.
    NodeNotFound { node_id: NodeId },
    /// An edge connects a node to itself.
    SelfReference { node_id: NodeId },
    /// Graph contains cycles, so no execution order exists.
    CycleDetected,
    /// The graph has no trigger node, so nothing can ever start a run.
    MissingTrigger,
    /// A node with no dependencies is not a trigger.
    NonTriggerEntry { node_id: NodeId },
    /// A trigger node has incoming edges.
    TriggerWithDependencies { node_id: NodeId },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound { node_id } => {
                write!(f, "node not found: {node_id}")
            }
            Self::SelfReference { node_id } => {
                write!(f, "node {node_id} cannot depend on itself")
            }
            Self::CycleDetected => write!(f, "workflow graph contains cycles"),
            Self::MissingTrigger => write!(f, "workflow has no trigger node"),
            Self::NonTriggerEntry { node_id } => {
                write!(f, "node {node_id} has no dependencies but is not a trigger")
            }
            Self::TriggerWithDependencies { node_id } => {
                write!(f, "trigger node {node_id} cannot have dependencies")
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// Errors from a single node invocation.
///
/// The variant determines retry eligibility: configuration problems are
/// static, so retrying cannot change the outcome; side-effect failures are
/// transient and eligible for retry by the step runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    /// Missing or invalid static node configuration. Never retried.
    Configuration { message: String },
    /// Transient failure of an external call. Eligible for retry.
    SideEffect { message: String },
    /// The side effect exceeded its time budget. Eligible for retry.
    Timeout { message: String },
}

impl ExecutorError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a side-effect error.
    pub fn side_effect(message: impl Into<String>) -> Self {
        Self::SideEffect {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Returns true if the step runner may retry after this error.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Configuration { .. } => false,
            Self::SideEffect { .. } | Self::Timeout { .. } => true,
        }
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { message } => write!(f, "configuration error: {message}"),
            Self::SideEffect { message } => write!(f, "side effect failed: {message}"),
            Self::Timeout { message } => write!(f, "side effect timed out: {message}"),
        }
    }
}

impl std::error::Error for ExecutorError {}

/// Run-level errors from the graph walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The workflow graph failed validation before any node ran.
    InvalidGraph(GraphError),
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGraph(e) => write!(f, "invalid workflow graph: {e}"),
        }
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidGraph(e) => Some(e),
        }
    }
}

impl From<GraphError> for ExecutionError {
    fn from(e: GraphError) -> Self {
        Self::InvalidGraph(e)
    }
}
