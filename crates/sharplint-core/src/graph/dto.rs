//! TOML deserialization types (DTO layer).
//!
//! These types exist solely for serde deserialization. Unknown keys are
//! rejected.
//! They are converted to [`super::model::RuleGraph`] via the loader.

use serde::Deserialize;

/// Raw TOML representation of one rule graph.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphDto {
    /// Graph name (e.g., "if").
    pub name: String,
    /// Nodes in declaration order.
    #[serde(default)]
    pub nodes: Vec<NodeDto>,
    /// Edges in declaration order; the order is the traversal priority.
    #[serde(default)]
    pub edges: Vec<EdgeDto>,
}

/// TOML representation of a node.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeDto {
    /// Identifier referenced by edges.
    pub id: String,
    /// Literal lexeme, action keyword, or `end_node`.
    pub data: String,
    /// `default`, `true` or `false`.
    #[serde(default)]
    pub check_offset: Option<String>,
}

/// TOML representation of an edge.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeDto {
    /// Source node id.
    pub from: String,
    /// Target node id.
    pub to: String,
    /// `default`, `true` or `false`.
    #[serde(default)]
    pub condition: Option<String>,
}
