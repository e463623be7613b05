//! Workflow node types and configurations.
//!
//! Nodes are the building blocks of workflows. Each node has a unique ID
//! within its workflow, a kind (trigger or action), and configuration specific
//! to its type.
//!
//! The node-type set is closed: dispatch is an exhaustive match over
//! `NodeConfig`, resolved at compile time, rather than a runtime registry.

use crate::http_request::HttpRequestConfig;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// A unique identifier for a node within a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Ulid);

impl NodeId {
    /// Creates a new random node ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Creates a node ID from a ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// The kind of a workflow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry points that initiate workflow execution.
    Trigger,
    /// Units of work that perform an external side effect.
    Action,
}

/// Configuration for a node, determining its type and behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeConfig {
    /// User-initiated trigger. Passes the seed context through unchanged.
    ManualTrigger,
    /// Stripe webhook trigger. Seeded from a normalized Stripe event.
    StripeTrigger,
    /// Google Form webhook trigger. Seeded from a normalized form response.
    GoogleFormTrigger,
    /// Outbound HTTP request action.
    HttpRequest(HttpRequestConfig),
}

impl NodeConfig {
    /// Returns the kind of node this configuration produces.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::ManualTrigger | Self::StripeTrigger | Self::GoogleFormTrigger => {
                NodeKind::Trigger
            }
            Self::HttpRequest(_) => NodeKind::Action,
        }
    }
}

/// A workflow node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node within the workflow.
    pub id: NodeId,
    /// Human-readable name for this node.
    pub name: String,
    /// Node configuration (determines type and behavior).
    pub config: NodeConfig,
}

impl Node {
    /// Creates a new node with the given configuration.
    #[must_use]
    pub fn new(name: impl Into<String>, config: NodeConfig) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            config,
        }
    }

    /// Creates a new node with a specific ID.
    #[must_use]
    pub fn with_id(id: NodeId, name: impl Into<String>, config: NodeConfig) -> Self {
        Self {
            id,
            name: name.into(),
            config,
        }
    }

    /// Returns the kind of this node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.config.kind()
    }

    /// Returns true if this node is a trigger.
    #[must_use]
    pub fn is_trigger(&self) -> bool {
        self.kind() == NodeKind::Trigger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_request::HttpMethod;

    #[test]
    fn node_id_display() {
        let id = NodeId::new();
        assert!(id.to_string().starts_with("node_"));
    }

    #[test]
    fn trigger_configs_are_triggers() {
        assert_eq!(NodeConfig::ManualTrigger.kind(), NodeKind::Trigger);
        assert_eq!(NodeConfig::StripeTrigger.kind(), NodeKind::Trigger);
        assert_eq!(NodeConfig::GoogleFormTrigger.kind(), NodeKind::Trigger);
    }

    #[test]
    fn http_request_is_an_action() {
        let node = Node::new(
            "Notify API",
            NodeConfig::HttpRequest(HttpRequestConfig {
                variable_name: Some("notify".to_string()),
                endpoint: Some("https://example.com/api".to_string()),
                method: HttpMethod::Post,
                body: None,
            }),
        );
        assert!(!node.is_trigger());
        assert_eq!(node.kind(), NodeKind::Action);
    }

    #[test]
    fn node_serde_roundtrip() {
        let node = Node::new("Manual", NodeConfig::ManualTrigger);
        let json = serde_json::to_string(&node).expect("serialize");
        assert!(json.contains("manual_trigger"));
        let parsed: Node = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(node, parsed);
    }
}
