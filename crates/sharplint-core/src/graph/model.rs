//! Typed rule graph model.
//!
//! All types here are validated on construction; the engine never sees a
//! dangling edge or an unknown action.

use crate::token::Token;
use std::collections::VecDeque;
use std::fmt;

/// Index of a node within its graph.
pub type NodeId = usize;

/// Validation errors for graph model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Graph name is empty.
    #[error("graph name must not be empty")]
    EmptyName,

    /// Node data is empty.
    #[error("node data must not be empty")]
    EmptyData,

    /// Tag looks like an action keyword but is not one.
    #[error("unknown action `{tag}`")]
    UnknownAction {
        /// The offending tag.
        tag: String,
    },

    /// `expression_` with nothing after it.
    #[error("`{tag}` names no stop token")]
    EmptyStopSet {
        /// The offending tag.
        tag: String,
    },

    /// Unknown `check_offset` or `condition` value.
    #[error("unknown value `{value}`, expected: default, true, false")]
    UnknownFlag {
        /// The invalid value.
        value: String,
    },

    /// Edge endpoint outside the node list.
    #[error("edge {from} -> {to} points outside the graph")]
    DanglingEdge {
        /// Source index.
        from: NodeId,
        /// Target index.
        to: NodeId,
    },

    /// Every node has an incoming edge.
    #[error("graph has no start node")]
    NoStartNode,

    /// A start node must match a lexeme.
    #[error("start node {node} is not a literal")]
    NonLiteralStart {
        /// Node index.
        node: NodeId,
    },

    /// A node no start node leads to.
    #[error("node {node} is unreachable from every start node")]
    Unreachable {
        /// Node index.
        node: NodeId,
    },
}

/// Behaviour triggered by an action node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `expression_<stops>`: spacing check up to one of the stop lexemes.
    Expression(Vec<String>),
    /// `identifier`: a dotted name.
    Identifier,
    /// `type`: the `var` placeholder.
    Type,
    /// `line`: one plain statement.
    Line,
    /// `block`: statements up to `}`.
    Block,
    /// `block_,`: comma-separated items up to `}`.
    BlockComma,
    /// `case_block`: statements up to `break` or `return`.
    CaseBlock,
    /// `switch_block`: case sections up to `}`.
    SwitchBlock,
    /// `increase_offset`.
    IncreaseOffset,
    /// `decrease_offset`.
    DecreaseOffset,
    /// `line_or_block`: a braced block or one indented statement.
    LineOrBlock,
    /// `just_block`: a braced block.
    JustBlock,
    /// `initialization`: object or collection initializer.
    Initialization,
    /// `check_()_in_catch`: whether a catch clause names an exception.
    CatchFilter,
}

/// Stop lexemes of a bare `expression` tag.
pub const DEFAULT_EXPRESSION_STOPS: &[&str] = &[")", ";"];

impl Action {
    /// Parses an action keyword. Returns `None` for literal-looking tags.
    ///
    /// # Errors
    ///
    /// Returns an error for tags shaped like an action keyword that the
    /// dispatch table does not know.
    pub fn parse(tag: &str) -> Result<Option<Self>, ModelError> {
        if let Some(rest) = tag.strip_prefix("expression") {
            if rest.is_empty() {
                return Ok(Some(Self::Expression(
                    DEFAULT_EXPRESSION_STOPS.iter().map(ToString::to_string).collect(),
                )));
            }
            let Some(stops) = rest.strip_prefix('_') else {
                return Err(ModelError::UnknownAction {
                    tag: tag.to_string(),
                });
            };
            let stops: Vec<String> = stops
                .split('|')
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect();
            if stops.is_empty() {
                return Err(ModelError::EmptyStopSet {
                    tag: tag.to_string(),
                });
            }
            return Ok(Some(Self::Expression(stops)));
        }
        let action = match tag {
            "identifier" => Self::Identifier,
            "type" => Self::Type,
            "line" => Self::Line,
            "block" => Self::Block,
            "block_," => Self::BlockComma,
            "case_block" => Self::CaseBlock,
            "switch_block" => Self::SwitchBlock,
            "increase_offset" => Self::IncreaseOffset,
            "decrease_offset" => Self::DecreaseOffset,
            "line_or_block" => Self::LineOrBlock,
            "just_block" => Self::JustBlock,
            "initialization" => Self::Initialization,
            "check_()_in_catch" => Self::CatchFilter,
            _ if tag.contains('_')
                && tag
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || "_(),".contains(c)) =>
            {
                return Err(ModelError::UnknownAction {
                    tag: tag.to_string(),
                });
            }
            _ => return Ok(None),
        };
        Ok(Some(action))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(stops) => write!(f, "expression_{}", stops.join("|")),
            Self::Identifier => f.write_str("identifier"),
            Self::Type => f.write_str("type"),
            Self::Line => f.write_str("line"),
            Self::Block => f.write_str("block"),
            Self::BlockComma => f.write_str("block_,"),
            Self::CaseBlock => f.write_str("case_block"),
            Self::SwitchBlock => f.write_str("switch_block"),
            Self::IncreaseOffset => f.write_str("increase_offset"),
            Self::DecreaseOffset => f.write_str("decrease_offset"),
            Self::LineOrBlock => f.write_str("line_or_block"),
            Self::JustBlock => f.write_str("just_block"),
            Self::Initialization => f.write_str("initialization"),
            Self::CatchFilter => f.write_str("check_()_in_catch"),
        }
    }
}

/// What a node matches or does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTag {
    /// Match this exact lexeme.
    Literal(String),
    /// Run an engine action.
    Action(Action),
    /// Graph completion.
    End,
}

impl NodeTag {
    /// Parses a node's data string.
    ///
    /// # Errors
    ///
    /// Returns an error for empty data or an unknown action keyword.
    pub fn parse(data: &str) -> Result<Self, ModelError> {
        if data.is_empty() {
            return Err(ModelError::EmptyData);
        }
        if data == "end_node" {
            return Ok(Self::End);
        }
        Ok(match Action::parse(data)? {
            Some(action) => Self::Action(action),
            None => Self::Literal(data.to_string()),
        })
    }

    /// Returns true if this is a literal equal to the token's lexeme.
    /// A `\n` literal accepts any line break.
    #[must_use]
    pub fn matches(&self, token: &Token) -> bool {
        match self {
            Self::Literal(value) => {
                *value == token.value || (value == "\\n" && token.is_newline())
            }
            _ => false,
        }
    }

    /// The literal lexeme, if any.
    #[must_use]
    pub fn literal(&self) -> Option<&str> {
        match self {
            Self::Literal(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for NodeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.write_str(value),
            Self::Action(action) => action.fmt(f),
            Self::End => f.write_str("end_node"),
        }
    }
}

/// Tri-state flag shared by `check_offset` and edge conditions.
fn parse_flag(value: &str) -> Result<Option<bool>, ModelError> {
    match value {
        "" | "default" => Ok(None),
        "true" | "True" => Ok(Some(true)),
        "false" | "False" => Ok(Some(false)),
        other => Err(ModelError::UnknownFlag {
            value: other.to_string(),
        }),
    }
}

/// Whether an indentation check accompanies a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetPolicy {
    /// Engine default: line breaks check the next line's indentation.
    #[default]
    Default,
    /// Also check indentation right after this action.
    Check,
    /// Do not check the indentation after this line break.
    Skip,
}

impl OffsetPolicy {
    /// Parses `default`, `true` or `false`.
    ///
    /// # Errors
    ///
    /// Returns an error for any other value.
    pub fn parse(value: &str) -> Result<Self, ModelError> {
        Ok(match parse_flag(value)? {
            None => Self::Default,
            Some(true) => Self::Check,
            Some(false) => Self::Skip,
        })
    }
}

/// Gate on an edge, tested against the last action result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeCondition {
    /// Always eligible.
    #[default]
    Always,
    /// Eligible when the last action returned `true`.
    True,
    /// Eligible when the last action returned `false`.
    False,
}

impl EdgeCondition {
    /// Parses `default`, `true` or `false`.
    ///
    /// # Errors
    ///
    /// Returns an error for any other value.
    pub fn parse(value: &str) -> Result<Self, ModelError> {
        Ok(match parse_flag(value)? {
            None => Self::Always,
            Some(true) => Self::True,
            Some(false) => Self::False,
        })
    }

    /// Returns true if the edge may be taken after an action returned `last`.
    #[must_use]
    pub fn admits(self, last: Option<bool>) -> bool {
        match self {
            Self::Always => true,
            Self::True => last == Some(true),
            Self::False => last == Some(false),
        }
    }
}

/// A graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// What the node matches or does.
    pub tag: NodeTag,
    /// Indentation policy.
    pub check_offset: OffsetPolicy,
}

/// A directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Source node.
    pub from: NodeId,
    /// Target node.
    pub to: NodeId,
    /// Traversal gate.
    pub condition: EdgeCondition,
}

/// A validated rule graph for one construct family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleGraph {
    name: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    starts: Vec<NodeId>,
}

impl RuleGraph {
    /// Builds a graph, computing its start nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if an edge dangles, no start node exists, a start
    /// node is not a literal, or a node is unreachable.
    pub fn new(name: &str, nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, ModelError> {
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        if let Some(edge) = edges
            .iter()
            .find(|e| e.from >= nodes.len() || e.to >= nodes.len())
        {
            return Err(ModelError::DanglingEdge {
                from: edge.from,
                to: edge.to,
            });
        }

        let starts: Vec<NodeId> = (0..nodes.len())
            .filter(|id| !edges.iter().any(|e| e.to == *id))
            .collect();
        if starts.is_empty() {
            return Err(ModelError::NoStartNode);
        }
        if let Some(&node) = starts
            .iter()
            .find(|&&id| nodes[id].tag.literal().is_none())
        {
            return Err(ModelError::NonLiteralStart { node });
        }

        let mut reached = vec![false; nodes.len()];
        let mut queue: VecDeque<NodeId> = starts.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            if std::mem::replace(&mut reached[id], true) {
                continue;
            }
            queue.extend(edges.iter().filter(|e| e.from == id).map(|e| e.to));
        }
        if let Some(node) = reached.iter().position(|r| !r) {
            return Err(ModelError::Unreachable { node });
        }

        Ok(Self {
            name: name.to_string(),
            nodes,
            edges,
            starts,
        })
    }

    /// Graph name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node by index.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// All nodes in declaration order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true for a graph without nodes (never constructed).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Outgoing edges of `id` in declaration order.
    pub fn successors(&self, id: NodeId) -> impl Iterator<Item = (NodeId, EdgeCondition)> + '_ {
        self.edges
            .iter()
            .filter(move |e| e.from == id)
            .map(|e| (e.to, e.condition))
    }

    /// Nodes without incoming edges.
    #[must_use]
    pub fn start_nodes(&self) -> &[NodeId] {
        &self.starts
    }

    /// Lexemes that enter this graph.
    pub fn start_lexemes(&self) -> impl Iterator<Item = &str> + '_ {
        self.starts
            .iter()
            .filter_map(|&id| self.nodes[id].tag.literal())
    }

    /// Start node matching `token`.
    #[must_use]
    pub fn start_for(&self, token: &Token) -> Option<NodeId> {
        self.starts
            .iter()
            .copied()
            .find(|&id| self.nodes[id].tag.matches(token))
    }

    /// Returns true if a literal successor of `id` exists.
    #[must_use]
    pub fn has_literal_successor(&self, id: NodeId) -> bool {
        self.successors(id)
            .any(|(to, _)| matches!(self.nodes[to].tag, NodeTag::Literal(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(data: &str) -> Node {
        Node {
            tag: NodeTag::parse(data).unwrap(),
            check_offset: OffsetPolicy::Default,
        }
    }

    fn edge(from: NodeId, to: NodeId) -> Edge {
        Edge {
            from,
            to,
            condition: EdgeCondition::Always,
        }
    }

    // --- Tag tests ---

    #[test]
    fn test_parse_actions() {
        assert_eq!(
            NodeTag::parse("expression_)").unwrap(),
            NodeTag::Action(Action::Expression(vec![")".to_string()]))
        );
        assert_eq!(
            NodeTag::parse("expression_;|)").unwrap(),
            NodeTag::Action(Action::Expression(vec![";".to_string(), ")".to_string()]))
        );
        assert_eq!(
            NodeTag::parse("expression").unwrap(),
            NodeTag::Action(Action::Expression(vec![")".to_string(), ";".to_string()]))
        );
        assert_eq!(
            NodeTag::parse("block_,").unwrap(),
            NodeTag::Action(Action::BlockComma)
        );
        assert_eq!(
            NodeTag::parse("check_()_in_catch").unwrap(),
            NodeTag::Action(Action::CatchFilter)
        );
        assert_eq!(NodeTag::parse("end_node").unwrap(), NodeTag::End);
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(
            NodeTag::parse("while").unwrap(),
            NodeTag::Literal("while".to_string())
        );
        assert_eq!(NodeTag::parse(" ").unwrap(), NodeTag::Literal(" ".to_string()));
        assert_eq!(
            NodeTag::parse("\\n").unwrap(),
            NodeTag::Literal("\\n".to_string())
        );
    }

    #[test]
    fn test_unknown_action_fails() {
        assert_eq!(
            NodeTag::parse("line_or_blok"),
            Err(ModelError::UnknownAction {
                tag: "line_or_blok".to_string()
            })
        );
        assert!(matches!(
            NodeTag::parse("expressionX"),
            Err(ModelError::UnknownAction { .. })
        ));
        assert!(matches!(
            NodeTag::parse("expression_"),
            Err(ModelError::EmptyStopSet { .. })
        ));
    }

    #[test]
    fn test_action_display_round_trips() {
        for tag in ["expression_;", "block_,", "check_()_in_catch", "line_or_block"] {
            assert_eq!(NodeTag::parse(tag).unwrap().to_string(), tag);
        }
    }

    #[test]
    fn test_newline_literal_matches_crlf() {
        let tag = NodeTag::parse("\\n").unwrap();
        assert!(tag.matches(&Token::new(0, 1, "\\r\\n")));
        assert!(!tag.matches(&Token::new(0, 1, " ")));
    }

    #[test]
    fn test_condition_admits() {
        assert!(EdgeCondition::Always.admits(None));
        assert!(EdgeCondition::True.admits(Some(true)));
        assert!(!EdgeCondition::True.admits(None));
        assert!(!EdgeCondition::False.admits(Some(true)));
        assert_eq!(OffsetPolicy::parse("false"), Ok(OffsetPolicy::Skip));
        assert!(EdgeCondition::parse("maybe").is_err());
    }

    // --- Graph tests ---

    #[test]
    fn test_start_nodes_and_successors() {
        let graph = RuleGraph::new(
            "if",
            vec![node("if"), node("else"), node(" "), node("line_or_block")],
            vec![edge(0, 2), edge(1, 3), edge(2, 3)],
        )
        .unwrap();
        assert_eq!(graph.start_nodes(), &[0, 1]);
        assert_eq!(graph.start_lexemes().collect::<Vec<_>>(), ["if", "else"]);
        assert_eq!(graph.start_for(&Token::new(0, 1, "else")), Some(1));
        assert_eq!(
            graph.successors(0).collect::<Vec<_>>(),
            [(2, EdgeCondition::Always)]
        );
        assert!(graph.has_literal_successor(0));
        assert!(!graph.has_literal_successor(2));
    }

    #[test]
    fn test_invalid_graphs() {
        assert_eq!(
            RuleGraph::new("x", vec![node("a")], vec![edge(0, 3)]),
            Err(ModelError::DanglingEdge { from: 0, to: 3 })
        );
        assert_eq!(
            RuleGraph::new("x", vec![node("a"), node("b")], vec![edge(0, 1), edge(1, 0)]),
            Err(ModelError::NoStartNode)
        );
        assert_eq!(
            RuleGraph::new("x", vec![node("block")], vec![]),
            Err(ModelError::NonLiteralStart { node: 0 })
        );
        assert_eq!(
            RuleGraph::new(
                "x",
                vec![node("a"), node("b"), node("c")],
                vec![edge(1, 2), edge(2, 1)]
            ),
            Err(ModelError::Unreachable { node: 1 })
        );
    }
}
