//! DTO → Domain model conversion with validation.

use std::collections::HashMap;

use super::dto::GraphDto;
use super::model::{Edge, EdgeCondition, ModelError, Node, NodeId, NodeTag, OffsetPolicy, RuleGraph};

/// Errors during DTO → Domain conversion.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A field-level validation error.
    #[error("{context}: {source}")]
    Validation {
        /// Where the error occurred (e.g., "if.nodes[3].data").
        context: String,
        /// The underlying model error.
        source: ModelError,
    },

    /// Two nodes share an id.
    #[error("{graph}: duplicate node id `{id}`")]
    DuplicateNode {
        /// Graph name.
        graph: String,
        /// The repeated id.
        id: String,
    },

    /// An edge names a node that does not exist.
    #[error("{context}: unknown node id `{id}`")]
    UnknownNode {
        /// Where the error occurred.
        context: String,
        /// The missing id.
        id: String,
    },
}

/// Converts a `GraphDto` to a validated `RuleGraph`.
///
/// # Errors
///
/// Returns the first error encountered during conversion.
pub fn load(dto: GraphDto) -> Result<RuleGraph, LoadError> {
    let graph_name = dto.name.clone();
    let mut ids: HashMap<&str, NodeId> = HashMap::new();
    let mut nodes = Vec::with_capacity(dto.nodes.len());

    for (i, node) in dto.nodes.iter().enumerate() {
        if ids.insert(node.id.as_str(), i).is_some() {
            return Err(LoadError::DuplicateNode {
                graph: graph_name,
                id: node.id.clone(),
            });
        }
        let tag = NodeTag::parse(&node.data).map_err(|source| LoadError::Validation {
            context: format!("{graph_name}.nodes[{i}].data"),
            source,
        })?;
        let check_offset = OffsetPolicy::parse(node.check_offset.as_deref().unwrap_or_default())
            .map_err(|source| LoadError::Validation {
                context: format!("{graph_name}.nodes[{i}].check_offset"),
                source,
            })?;
        nodes.push(Node { tag, check_offset });
    }

    let lookup = |id: &str, context: String| {
        ids.get(id).copied().ok_or_else(|| LoadError::UnknownNode {
            context,
            id: id.to_string(),
        })
    };
    let edges = dto
        .edges
        .iter()
        .enumerate()
        .map(|(i, edge)| {
            let condition = EdgeCondition::parse(edge.condition.as_deref().unwrap_or_default())
                .map_err(|source| LoadError::Validation {
                    context: format!("{graph_name}.edges[{i}].condition"),
                    source,
                })?;
            Ok(Edge {
                from: lookup(&edge.from, format!("{graph_name}.edges[{i}].from"))?,
                to: lookup(&edge.to, format!("{graph_name}.edges[{i}].to"))?,
                condition,
            })
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    RuleGraph::new(&dto.name, nodes, edges).map_err(|source| LoadError::Validation {
        context: graph_name,
        source,
    })
}
