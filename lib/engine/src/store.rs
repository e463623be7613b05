//! The persistence boundary.
//!
//! The engine reads workflows by ID through this trait and defines no storage
//! schema of its own. The in-memory implementation backs the server's
//! registration endpoint and tests.

use crate::definition::Workflow;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;
use tributary_core::WorkflowId;

/// Errors from workflow storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No workflow with the given ID exists.
    NotFound { workflow_id: WorkflowId },
    /// The backing store failed.
    Backend { message: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { workflow_id } => write!(f, "workflow not found: {workflow_id}"),
            Self::Backend { message } => write!(f, "workflow store error: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Read/write access to persisted workflow definitions.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Loads a workflow by ID.
    async fn load(&self, workflow_id: WorkflowId) -> Result<Workflow, StoreError>;

    /// Saves a workflow definition, replacing any existing one with the same
    /// ID.
    async fn save(&self, workflow: Workflow) -> Result<(), StoreError>;
}

/// A workflow store held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
    workflows: RwLock<HashMap<WorkflowId, Workflow>>,
}

impl InMemoryWorkflowStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored workflows.
    pub async fn len(&self) -> usize {
        self.workflows.read().await.len()
    }

    /// Returns true if the store holds no workflows.
    pub async fn is_empty(&self) -> bool {
        self.workflows.read().await.is_empty()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn load(&self, workflow_id: WorkflowId) -> Result<Workflow, StoreError> {
        self.workflows
            .read()
            .await
            .get(&workflow_id)
            .cloned()
            .ok_or(StoreError::NotFound { workflow_id })
    }

    async fn save(&self, workflow: Workflow) -> Result<(), StoreError> {
        self.workflows.write().await.insert(workflow.id, workflow);
        Ok(())
    }
}
