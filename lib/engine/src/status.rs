//! Live per-node status events.
//!
//! The editor subscribes to a channel scoped to one (workflow, run) pair and
//! updates each node's badge independently. Delivery is at-least-once;
//! subscribers must treat a repeated (node, status) pair as idempotent.

use crate::node::NodeId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use tributary_core::{WorkflowId, WorkflowRunId};

/// The status of a node as shown in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// The node is about to execute.
    Loading,
    /// The node completed successfully.
    Success,
    /// The node failed with its own error.
    Error,
    /// The node never ran because an upstream dependency failed.
    NotRun,
}

/// A status event for one node within one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// The workflow being executed.
    pub workflow_id: WorkflowId,
    /// The run this event belongs to.
    pub run_id: WorkflowRunId,
    /// The node the status applies to.
    pub node_id: NodeId,
    /// The new status.
    pub status: NodeStatus,
    /// When the status was observed.
    pub timestamp: DateTime<Utc>,
}

impl StatusEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(
        workflow_id: WorkflowId,
        run_id: WorkflowRunId,
        node_id: NodeId,
        status: NodeStatus,
    ) -> Self {
        Self {
            workflow_id,
            run_id,
            node_id,
            status,
            timestamp: Utc::now(),
        }
    }
}

/// Returns the channel key for one run's status events.
///
/// Scoping the key to the run keeps concurrent runs of the same workflow from
/// cross-talking.
#[must_use]
pub fn status_subject(workflow_id: WorkflowId, run_id: WorkflowRunId) -> String {
    format!("workflow.status.{workflow_id}.{run_id}")
}

/// Errors from publishing a status event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// Failed to connect to the status channel.
    ConnectionFailed { message: String },
    /// Failed to publish an event.
    PublishFailed { message: String },
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed { message } => {
                write!(f, "status channel connection failed: {message}")
            }
            Self::PublishFailed { message } => write!(f, "status publish failed: {message}"),
        }
    }
}

impl std::error::Error for PublishError {}

/// Publishes status events to live subscribers.
///
/// The scheduler awaits each publish before proceeding, so the order
/// subscribers observe matches execution order.
#[async_trait]
pub trait StatusPublisher: Send + Sync {
    /// Publishes one event.
    async fn publish(&self, event: &StatusEvent) -> Result<(), PublishError>;
}

/// A publisher that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

#[async_trait]
impl StatusPublisher for NoopPublisher {
    async fn publish(&self, _event: &StatusEvent) -> Result<(), PublishError> {
        Ok(())
    }
}

/// A publisher that forwards events to an in-process channel.
///
/// Useful for tests and for serving a local editor session without a broker.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: mpsc::UnboundedSender<StatusEvent>,
}

impl ChannelPublisher {
    /// Creates a publisher and the receiver for its events.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StatusEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl StatusPublisher for ChannelPublisher {
    async fn publish(&self, event: &StatusEvent) -> Result<(), PublishError> {
        // A dropped receiver means nobody is watching; that is not an error.
        let _ = self.sender.send(event.clone());
        Ok(())
    }
}
