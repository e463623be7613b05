//! Workflow graph implementation using petgraph.
//!
//! Workflows are directed acyclic graphs where nodes are triggers or actions
//! and edges are execution dependencies. The graph is serialized as explicit
//! node and edge lists so it survives storage as a plain JSON document.

use crate::edge::Edge;
use crate::error::GraphError;
use crate::node::{Node, NodeId};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A workflow graph using petgraph's directed graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowGraph {
    /// The underlying directed graph.
    #[serde(with = "graph_serde")]
    graph: DiGraph<Node, Edge>,
    /// Map from NodeId to petgraph's NodeIndex for O(1) lookup.
    #[serde(skip)]
    node_index_map: HashMap<NodeId, NodeIndex>,
}

impl WorkflowGraph {
    /// Creates a new empty workflow graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_index_map: HashMap::new(),
        }
    }

    /// Adds a node to the graph and returns its ID.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let node_id = node.id;
        let index = self.graph.add_node(node);
        self.node_index_map.insert(node_id, index);
        node_id
    }

    /// Removes a node from the graph, along with all its edges.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let index = self.node_index_map.remove(&node_id)?;
        let node = self.graph.remove_node(index);
        // Removal swaps indices, so the map must be rebuilt.
        self.rebuild_index_map();
        node
    }

    /// Returns a reference to a node by its ID.
    #[must_use]
    pub fn get_node(&self, node_id: NodeId) -> Option<&Node> {
        let index = self.node_index_map.get(&node_id)?;
        self.graph.node_weight(*index)
    }

    /// Adds a dependency edge from `source` to `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if either node doesn't exist or the edge would
    /// connect a node to itself.
    pub fn add_edge(
        &mut self,
        source_id: NodeId,
        target_id: NodeId,
        edge: Edge,
    ) -> Result<(), GraphError> {
        if source_id == target_id {
            return Err(GraphError::SelfReference { node_id: source_id });
        }

        let source_index = self
            .node_index_map
            .get(&source_id)
            .ok_or(GraphError::NodeNotFound { node_id: source_id })?;

        let target_index = self
            .node_index_map
            .get(&target_id)
            .ok_or(GraphError::NodeNotFound { node_id: target_id })?;

        self.graph.add_edge(*source_index, *target_index, edge);
        Ok(())
    }

    /// Returns all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Returns the number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns nodes that have no incoming edges (the trigger roots).
    pub fn entry_nodes(&self) -> Vec<&Node> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph.edges_directed(idx, Direction::Incoming).count() == 0)
            .filter_map(|idx| self.graph.node_weight(idx))
            .collect()
    }

    /// Returns nodes that have no outgoing edges (terminal nodes).
    pub fn terminal_nodes(&self) -> Vec<&Node> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph.edges_directed(idx, Direction::Outgoing).count() == 0)
            .filter_map(|idx| self.graph.node_weight(idx))
            .collect()
    }

    /// Returns the downstream neighbors of a node.
    pub fn successors(&self, node_id: NodeId) -> Vec<&Node> {
        let Some(&index) = self.node_index_map.get(&node_id) else {
            return Vec::new();
        };

        self.graph
            .neighbors_directed(index, Direction::Outgoing)
            .filter_map(|idx| self.graph.node_weight(idx))
            .collect()
    }

    /// Returns the upstream dependencies of a node, in edge declaration order.
    ///
    /// Declaration order is what makes dependency-output merging
    /// deterministic: later-declared dependencies win key collisions.
    pub fn dependencies(&self, node_id: NodeId) -> Vec<&Node> {
        let Some(&index) = self.node_index_map.get(&node_id) else {
            return Vec::new();
        };

        let mut incoming: Vec<_> = self
            .graph
            .edges_directed(index, Direction::Incoming)
            .collect();
        // edges_directed yields most-recently-added first; edge indices are
        // assigned in insertion order.
        incoming.sort_by_key(|edge| edge.id().index());

        incoming
            .into_iter()
            .filter_map(|edge| self.graph.node_weight(edge.source()))
            .collect()
    }

    /// Validates the workflow graph.
    ///
    /// Checks that the graph is acyclic, that at least one trigger exists,
    /// that every root is a trigger, and that no trigger has dependencies.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first validation failure.
    pub fn validate(&self) -> Result<(), GraphError> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(GraphError::CycleDetected);
        }

        let mut has_trigger = false;
        for idx in self.graph.node_indices() {
            let Some(node) = self.graph.node_weight(idx) else {
                continue;
            };
            let incoming = self.graph.edges_directed(idx, Direction::Incoming).count();

            if node.is_trigger() {
                has_trigger = true;
                if incoming > 0 {
                    return Err(GraphError::TriggerWithDependencies { node_id: node.id });
                }
            } else if incoming == 0 {
                return Err(GraphError::NonTriggerEntry { node_id: node.id });
            }
        }

        if !has_trigger {
            return Err(GraphError::MissingTrigger);
        }

        Ok(())
    }

    /// Rebuilds the node index map after deserialization or node removal.
    pub fn rebuild_index_map(&mut self) {
        self.node_index_map.clear();
        for index in self.graph.node_indices() {
            if let Some(node) = self.graph.node_weight(index) {
                self.node_index_map.insert(node.id, index);
            }
        }
    }
}

impl Default for WorkflowGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Custom serde for petgraph DiGraph: explicit node and edge lists.
mod graph_serde {
    use super::*;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeStruct;

    pub fn serialize<S>(graph: &DiGraph<Node, Edge>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let nodes: Vec<_> = graph.node_weights().cloned().collect();
        let edges: Vec<_> = graph
            .edge_references()
            .map(|e| {
                let source_id = graph.node_weight(e.source()).map(|n| n.id);
                let target_id = graph.node_weight(e.target()).map(|n| n.id);
                (source_id, target_id, e.weight().clone())
            })
            .collect();

        let mut state = serializer.serialize_struct("Graph", 2)?;
        state.serialize_field("nodes", &nodes)?;
        state.serialize_field("edges", &edges)?;
        state.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DiGraph<Node, Edge>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        type EdgeTuple = (Option<NodeId>, Option<NodeId>, Edge);

        struct GraphVisitor;

        impl<'de> Visitor<'de> for GraphVisitor {
            type Value = DiGraph<Node, Edge>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a workflow graph with nodes and edges")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut nodes: Option<Vec<Node>> = None;
                let mut edges: Option<Vec<EdgeTuple>> = None;

                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "nodes" => nodes = Some(map.next_value()?),
                        "edges" => edges = Some(map.next_value()?),
                        _ => {
                            let _ = map.next_value::<serde::de::IgnoredAny>()?;
                        }
                    }
                }

                let nodes = nodes.unwrap_or_default();
                let edges = edges.unwrap_or_default();

                let mut graph = DiGraph::new();
                let mut id_to_index = HashMap::new();

                for node in nodes {
                    let id = node.id;
                    let index = graph.add_node(node);
                    id_to_index.insert(id, index);
                }

                for (source_id, target_id, edge) in edges {
                    let (Some(source), Some(target)) = (source_id, target_id) else {
                        continue;
                    };
                    let (Some(&source_idx), Some(&target_idx)) =
                        (id_to_index.get(&source), id_to_index.get(&target))
                    else {
                        continue;
                    };
                    graph.add_edge(source_idx, target_idx, edge);
                }

                Ok(graph)
            }
        }

        deserializer.deserialize_struct("Graph", &["nodes", "edges"], GraphVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_request::{HttpMethod, HttpRequestConfig};
    use crate::node::NodeConfig;

    fn trigger(name: &str) -> Node {
        Node::new(name, NodeConfig::ManualTrigger)
    }

    fn action(name: &str) -> Node {
        Node::new(
            name,
            NodeConfig::HttpRequest(HttpRequestConfig {
                variable_name: Some(name.to_string()),
                endpoint: Some("https://example.com".to_string()),
                method: HttpMethod::Get,
                body: None,
            }),
        )
    }

    #[test]
    fn add_and_get_node() {
        let mut graph = WorkflowGraph::new();
        let node = trigger("Start");
        let node_id = node.id;
        graph.add_node(node);

        assert_eq!(graph.get_node(node_id).unwrap().name, "Start");
    }

    #[test]
    fn add_edge_rejects_missing_node() {
        let mut graph = WorkflowGraph::new();
        let t = trigger("Start");
        let t_id = graph.add_node(t);

        let result = graph.add_edge(t_id, NodeId::new(), Edge::new());
        assert!(matches!(result, Err(GraphError::NodeNotFound { .. })));
    }

    #[test]
    fn add_edge_rejects_self_reference() {
        let mut graph = WorkflowGraph::new();
        let t_id = graph.add_node(trigger("Start"));

        let result = graph.add_edge(t_id, t_id, Edge::new());
        assert!(matches!(result, Err(GraphError::SelfReference { .. })));
    }

    #[test]
    fn entry_nodes_returns_roots() {
        let mut graph = WorkflowGraph::new();
        let t_id = graph.add_node(trigger("Start"));
        let a_id = graph.add_node(action("Fetch"));
        graph.add_edge(t_id, a_id, Edge::new()).unwrap();

        let entries = graph.entry_nodes();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, t_id);

        let terminals = graph.terminal_nodes();
        assert_eq!(terminals.len(), 1);
        assert_eq!(terminals[0].id, a_id);
    }

    #[test]
    fn dependencies_preserve_declaration_order() {
        let mut graph = WorkflowGraph::new();
        let t_id = graph.add_node(trigger("Start"));
        let a_id = graph.add_node(action("A"));
        let b_id = graph.add_node(action("B"));
        let join_id = graph.add_node(action("Join"));

        graph.add_edge(t_id, a_id, Edge::new()).unwrap();
        graph.add_edge(t_id, b_id, Edge::new()).unwrap();
        graph.add_edge(a_id, join_id, Edge::new()).unwrap();
        graph.add_edge(b_id, join_id, Edge::new()).unwrap();

        let deps: Vec<_> = graph.dependencies(join_id).iter().map(|n| n.id).collect();
        assert_eq!(deps, vec![a_id, b_id]);
    }

    #[test]
    fn validate_accepts_simple_workflow() {
        let mut graph = WorkflowGraph::new();
        let t_id = graph.add_node(trigger("Start"));
        let a_id = graph.add_node(action("Fetch"));
        graph.add_edge(t_id, a_id, Edge::new()).unwrap();

        assert!(graph.validate().is_ok());
    }

    #[test]
    fn validate_detects_cycle() {
        let mut graph = WorkflowGraph::new();
        let t_id = graph.add_node(trigger("Start"));
        let a_id = graph.add_node(action("A"));
        let b_id = graph.add_node(action("B"));
        graph.add_edge(t_id, a_id, Edge::new()).unwrap();
        graph.add_edge(a_id, b_id, Edge::new()).unwrap();
        graph.add_edge(b_id, a_id, Edge::new()).unwrap();

        assert_eq!(graph.validate(), Err(GraphError::CycleDetected));
    }

    #[test]
    fn validate_requires_a_trigger() {
        let mut graph = WorkflowGraph::new();
        graph.add_node(action("Orphan"));

        assert!(matches!(
            graph.validate(),
            Err(GraphError::NonTriggerEntry { .. })
        ));

        let empty = WorkflowGraph::new();
        assert_eq!(empty.validate(), Err(GraphError::MissingTrigger));
    }

    #[test]
    fn validate_rejects_trigger_with_dependencies() {
        let mut graph = WorkflowGraph::new();
        let t1_id = graph.add_node(trigger("First"));
        let t2_id = graph.add_node(trigger("Second"));
        graph.add_edge(t1_id, t2_id, Edge::new()).unwrap();

        assert!(matches!(
            graph.validate(),
            Err(GraphError::TriggerWithDependencies { .. })
        ));
    }

    #[test]
    fn graph_serde_roundtrip() {
        let mut graph = WorkflowGraph::new();
        let t_id = graph.add_node(trigger("Start"));
        let a_id = graph.add_node(action("Fetch"));
        graph.add_edge(t_id, a_id, Edge::new()).unwrap();

        let json = serde_json::to_string(&graph).expect("serialize");
        let mut parsed: WorkflowGraph = serde_json::from_str(&json).expect("deserialize");
        parsed.rebuild_index_map();

        assert_eq!(parsed.node_count(), 2);
        assert_eq!(parsed.edge_count(), 1);
        assert!(parsed.get_node(t_id).is_some());
        assert_eq!(parsed.successors(t_id).len(), 1);
    }
}
