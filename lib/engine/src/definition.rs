//! Workflow definition types.
//!
//! A workflow is a named automation: metadata plus a directed graph of
//! trigger and action nodes.

use crate::error::GraphError;
use crate::graph::WorkflowGraph;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tributary_core::WorkflowId;

/// Metadata for a workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    /// Human-readable name for this workflow.
    pub name: String,
    /// Description of what this workflow does.
    pub description: Option<String>,
    /// Whether this workflow is enabled. Disabled workflows refuse triggers.
    pub enabled: bool,
    /// When this workflow was created.
    pub created_at: DateTime<Utc>,
    /// When this workflow was last updated.
    pub updated_at: DateTime<Utc>,
}

impl WorkflowMetadata {
    /// Creates new metadata with default values.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: None,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A complete workflow definition: the unit the editor saves and the engine
/// executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique identifier for this workflow.
    pub id: WorkflowId,
    /// Workflow metadata.
    pub metadata: WorkflowMetadata,
    /// The workflow graph (nodes and edges).
    pub graph: WorkflowGraph,
}

impl Workflow {
    /// Creates a new workflow with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: WorkflowId::new(),
            metadata: WorkflowMetadata::new(name),
            graph: WorkflowGraph::new(),
        }
    }

    /// Creates a workflow with a specific ID.
    #[must_use]
    pub fn with_id(id: WorkflowId, name: impl Into<String>) -> Self {
        Self {
            id,
            metadata: WorkflowMetadata::new(name),
            graph: WorkflowGraph::new(),
        }
    }

    /// Returns the workflow name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Returns whether the workflow is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.metadata.enabled
    }

    /// Enables the workflow.
    pub fn enable(&mut self) {
        self.metadata.enabled = true;
        self.metadata.updated_at = Utc::now();
    }

    /// Disables the workflow.
    pub fn disable(&mut self) {
        self.metadata.enabled = false;
        self.metadata.updated_at = Utc::now();
    }

    /// Validates the workflow graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph is cyclic or its roots are not triggers.
    pub fn validate(&self) -> Result<(), GraphError> {
        self.graph.validate()
    }
}
