//! Run lifecycle types.
//!
//! A run is one materialization of a workflow, triggered by one external
//! event. It exclusively owns its execution context for its lifetime; runs of
//! the same workflow never share context state.

use crate::context::ExecutionContext;
use crate::node::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tributary_core::{WorkflowId, WorkflowRunId};

/// The overall state of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Run accepted, not yet executing.
    Queued,
    /// Run is actively executing.
    Running,
    /// All reachable nodes completed successfully.
    Completed,
    /// Every trigger root failed, so nothing downstream could run.
    Failed,
    /// Run was cancelled; no further nodes were scheduled.
    Cancelled,
}

impl RunState {
    /// Returns true if this is a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// The execution state of a single node within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRunState {
    /// Waiting for dependencies to complete.
    Pending,
    /// Currently executing.
    Running,
    /// Completed successfully.
    Succeeded,
    /// Failed with its own error.
    Failed,
    /// Never executed because an upstream dependency failed, or the run was
    /// cancelled first. Distinct from `Failed`: the node itself did nothing
    /// wrong.
    NotRun,
}

impl NodeRunState {
    /// Returns true if this is a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::NotRun)
    }
}

/// Execution record for a single node within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRunRecord {
    /// The node this record describes.
    pub node_id: NodeId,
    /// Current execution state.
    pub state: NodeRunState,
    /// When execution started.
    pub started_at: Option<DateTime<Utc>>,
    /// When execution finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// Error message if failed.
    pub error: Option<String>,
}

impl NodeRunRecord {
    /// Creates a pending record.
    #[must_use]
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            state: NodeRunState::Pending,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    /// Marks the node as running.
    pub fn start(&mut self) {
        self.state = NodeRunState::Running;
        self.started_at = Some(Utc::now());
    }

    /// Marks the node as succeeded.
    pub fn succeed(&mut self) {
        self.state = NodeRunState::Succeeded;
        self.finished_at = Some(Utc::now());
    }

    /// Marks the node as failed.
    pub fn fail(&mut self, error: String) {
        self.state = NodeRunState::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }

    /// Marks the node as never run.
    pub fn skip(&mut self) {
        self.state = NodeRunState::NotRun;
        self.finished_at = Some(Utc::now());
    }
}

/// The result of executing a workflow run to a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// The run that produced this outcome.
    pub run_id: WorkflowRunId,
    /// The workflow that was executed.
    pub workflow_id: WorkflowId,
    /// Terminal run state.
    pub state: RunState,
    /// When execution started.
    pub started_at: DateTime<Utc>,
    /// When execution finished.
    pub finished_at: DateTime<Utc>,
    /// Per-node execution records.
    pub nodes: HashMap<NodeId, NodeRunRecord>,
    /// The final context: terminal-node outputs merged in node insertion
    /// order.
    pub context: ExecutionContext,
}

impl RunOutcome {
    /// Returns the state of a node, if it exists in this run.
    #[must_use]
    pub fn node_state(&self, node_id: NodeId) -> Option<NodeRunState> {
        self.nodes.get(&node_id).map(|record| record.state)
    }

    /// Returns true if any node failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.nodes
            .values()
            .any(|record| record.state == NodeRunState::Failed)
    }
}
