//! Edge types for workflow graphs.
//!
//! An edge is a directed dependency: the target node may only run after the
//! source node completes successfully, and the target's input context includes
//! the source's output. Edge insertion order is the declaration order used to
//! break ties when merging multiple dependency outputs.

use serde::{Deserialize, Serialize};

/// A directed dependency between two nodes in a workflow graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Optional human-readable label shown in the editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    /// Creates an unlabeled edge.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an edge with a label.
    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlabeled_edge_serializes_compactly() {
        let edge = Edge::new();
        let json = serde_json::to_string(&edge).expect("serialize");
        assert_eq!(json, "{}");
    }

    #[test]
    fn labeled_edge_roundtrip() {
        let edge = Edge::labeled("on success");
        let json = serde_json::to_string(&edge).expect("serialize");
        let parsed: Edge = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(edge, parsed);
    }
}
