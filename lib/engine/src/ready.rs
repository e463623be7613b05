//! Remaining-work tracking for workflow execution.
//!
//! The tracker holds a shrinking copy of the dependency graph:
//! - Completed nodes are removed, unblocking their successors
//! - Failed nodes get a self-edge so they never become ready and keep their
//!   downstream nodes blocked
//! - Nodes with zero incoming edges and not currently executing are ready
//! - No ready nodes and nothing executing means the run has settled

use crate::graph::WorkflowGraph;
use crate::node::NodeId;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// Tracks which nodes still need to execute.
#[derive(Debug, Clone)]
pub struct ReadyTracker {
    /// Dependency skeleton: node weights are NodeIds, edges unweighted.
    graph: DiGraph<NodeId, ()>,
    /// Map from NodeId to graph index for O(1) lookup.
    node_to_index: HashMap<NodeId, NodeIndex>,
    /// Nodes that are currently executing.
    executing: HashSet<NodeId>,
}

impl ReadyTracker {
    /// Builds a tracker covering every node and edge of the workflow graph.
    #[must_use]
    pub fn from_graph(workflow_graph: &WorkflowGraph) -> Self {
        let mut graph = DiGraph::new();
        let mut node_to_index = HashMap::new();

        for node in workflow_graph.nodes() {
            let idx = graph.add_node(node.id);
            node_to_index.insert(node.id, idx);
        }

        for node in workflow_graph.nodes() {
            let source_idx = node_to_index[&node.id];
            for successor in workflow_graph.successors(node.id) {
                let target_idx = node_to_index[&successor.id];
                graph.add_edge(source_idx, target_idx, ());
            }
        }

        Self {
            graph,
            node_to_index,
            executing: HashSet::new(),
        }
    }

    /// Returns nodes with no pending dependencies that are not yet executing.
    #[must_use]
    pub fn ready_nodes(&self) -> Vec<NodeId> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph.edges_directed(idx, Direction::Incoming).count() == 0
            })
            .filter_map(|idx| {
                let node_id = self.graph.node_weight(idx)?;
                if self.executing.contains(node_id) {
                    return None;
                }
                Some(*node_id)
            })
            .collect()
    }

    /// Marks a node as currently executing so it is not scheduled twice.
    pub fn mark_executing(&mut self, node_id: NodeId) {
        if self.node_to_index.contains_key(&node_id) {
            self.executing.insert(node_id);
        }
    }

    /// Marks a node as completed, removing it and unblocking successors.
    pub fn mark_completed(&mut self, node_id: NodeId) {
        self.executing.remove(&node_id);
        if let Some(idx) = self.node_to_index.remove(&node_id) {
            self.graph.remove_node(idx);
            // Removal invalidates indices.
            self.rebuild_index_map();
        }
    }

    /// Marks a node as failed.
    ///
    /// The self-edge keeps the node permanently un-ready, which transitively
    /// blocks everything downstream of it.
    pub fn mark_failed(&mut self, node_id: NodeId) {
        self.executing.remove(&node_id);
        if let Some(&idx) = self.node_to_index.get(&node_id) {
            self.graph.add_edge(idx, idx, ());
        }
    }

    /// Returns true once nothing is ready and nothing is executing.
    ///
    /// Either every node completed, or the remaining nodes are blocked behind
    /// failures.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.executing.is_empty() && self.ready_nodes().is_empty()
    }

    /// Returns the number of nodes remaining (executing or blocked).
    #[must_use]
    pub fn remaining_count(&self) -> usize {
        self.graph.node_count()
    }

    fn rebuild_index_map(&mut self) {
        self.node_to_index.clear();
        for idx in self.graph.node_indices() {
            if let Some(&node_id) = self.graph.node_weight(idx) {
                self.node_to_index.insert(node_id, idx);
            }
        }
    }
}
