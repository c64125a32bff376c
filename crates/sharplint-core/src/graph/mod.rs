//! Rule graphs: data-driven descriptions of statement shapes.
//!
//! Each graph names the lexemes and engine actions one construct family
//! is made of. Graphs are plain TOML so new shapes can be added without
//! touching the engine.
//!
//! # Architecture
//!
//! ```text
//! TOML text
//!   ↓ serde (DTO layer)
//! dto::GraphDto
//!   ↓ validate + convert
//! model::RuleGraph
//!   ↓ GraphRepository::insert()
//! lookup by start lexeme or by name
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::token::Token;
use model::{NodeId, RuleGraph};

pub mod dto;
pub mod loader;
pub mod model;

/// Graphs shipped with the crate, by file name.
const BUILTIN: &[(&str, &str)] = &[
    ("just_block.toml", include_str!("../../graphs/just_block.toml")),
    ("initializer.toml", include_str!("../../graphs/initializer.toml")),
    ("if.toml", include_str!("../../graphs/if.toml")),
    ("while.toml", include_str!("../../graphs/while.toml")),
    ("do.toml", include_str!("../../graphs/do.toml")),
    ("for.toml", include_str!("../../graphs/for.toml")),
    ("foreach.toml", include_str!("../../graphs/foreach.toml")),
    ("switch.toml", include_str!("../../graphs/switch.toml")),
    ("case.toml", include_str!("../../graphs/case.toml")),
    ("try.toml", include_str!("../../graphs/try.toml")),
    ("class.toml", include_str!("../../graphs/class.toml")),
    ("enum.toml", include_str!("../../graphs/enum.toml")),
    ("namespace.toml", include_str!("../../graphs/namespace.toml")),
];

/// Lexeme of graphs entered from a line break. Those are reached by name
/// only, so they may share it.
const LINE_BREAK: &str = "\\n";

/// Errors from parsing TOML and loading rule graphs.
#[derive(Debug, thiserror::Error)]
pub enum LoadGraphError {
    /// TOML deserialization failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Domain model validation failed.
    #[error("{0}")]
    Load(#[from] loader::LoadError),

    /// A graph file could not be read.
    #[error("Failed to read graph file '{path}': {source}")]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Two graphs claim the same entry lexeme.
    #[error("graphs `{first}` and `{second}` both start with `{lexeme}`")]
    DuplicateStart {
        /// The shared lexeme.
        lexeme: String,
        /// Graph already registered.
        first: String,
        /// Graph being added.
        second: String,
    },
}

/// Parses one graph definition.
///
/// # Errors
///
/// Returns an error if TOML parsing or model validation fails.
pub fn load_graph_from_toml(content: &str) -> Result<RuleGraph, LoadGraphError> {
    let dto: dto::GraphDto = toml::from_str(content)?;
    Ok(loader::load(dto)?)
}

/// The set of graphs the engine dispatches on.
#[derive(Debug, Clone, Default)]
pub struct GraphRepository {
    graphs: Vec<RuleGraph>,
}

impl GraphRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the built-in graph set.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in definition is invalid.
    pub fn builtin() -> Result<Self, LoadGraphError> {
        let mut repository = Self::new();
        for (file, content) in BUILTIN {
            debug!("Loading built-in graph {}", file);
            repository.insert(load_graph_from_toml(content)?)?;
        }
        Ok(repository)
    }

    /// Adds a graph. A graph with the same name is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if another graph already starts with one of this
    /// graph's entry lexemes.
    pub fn insert(&mut self, graph: RuleGraph) -> Result<(), LoadGraphError> {
        if let Some(pos) = self.graphs.iter().position(|g| g.name() == graph.name()) {
            warn!("Graph '{}' replaces an earlier definition", graph.name());
            self.graphs.remove(pos);
        }
        for lexeme in graph.start_lexemes().filter(|l| *l != LINE_BREAK) {
            if let Some(other) = self
                .graphs
                .iter()
                .find(|g| g.start_lexemes().any(|l| l == lexeme))
            {
                return Err(LoadGraphError::DuplicateStart {
                    lexeme: lexeme.to_string(),
                    first: other.name().to_string(),
                    second: graph.name().to_string(),
                });
            }
        }
        self.graphs.push(graph);
        Ok(())
    }

    /// Loads every `*.toml` file under `dir`, in path order.
    ///
    /// Returns the number of graphs loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or is not a valid graph.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, LoadGraphError> {
        let mut count = 0;
        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "toml"))
        {
            let path = entry.path();
            debug!("Loading graph {}", path.display());
            let content = std::fs::read_to_string(path).map_err(|source| LoadGraphError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            self.insert(load_graph_from_toml(&content)?)?;
            count += 1;
        }
        Ok(count)
    }

    /// Graph by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RuleGraph> {
        self.graphs.iter().find(|g| g.name() == name)
    }

    /// Graph and start node entered by `token`. Line breaks never enter a
    /// graph this way.
    #[must_use]
    pub fn find_by_start(&self, token: &Token) -> Option<(&RuleGraph, NodeId)> {
        if token.is_newline() {
            return None;
        }
        self.graphs
            .iter()
            .find_map(|g| g.start_for(token).map(|id| (g, id)))
    }

    /// All graphs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RuleGraph> {
        self.graphs.iter()
    }

    /// Number of graphs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    /// Returns true if no graph is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{Action, NodeTag};

    const WHILE: &str = r#"
name = "while"

[[nodes]]
id = "while"
data = "while"

[[nodes]]
id = "body"
data = "line_or_block"

[[edges]]
from = "while"
to = "body"
"#;

    #[test]
    fn test_builtin_graphs_load() {
        let repository = GraphRepository::builtin().unwrap();
        assert_eq!(repository.len(), BUILTIN.len());
        for name in ["just_block", "initializer", "case", "if", "try", "class"] {
            assert!(repository.get(name).is_some(), "missing graph {name}");
        }
    }

    #[test]
    fn test_find_by_start() {
        let repository = GraphRepository::builtin().unwrap();
        let (graph, node) = repository.find_by_start(&Token::new(0, 1, "else")).unwrap();
        assert_eq!(graph.name(), "if");
        assert_eq!(
            graph.node(node).map(|n| &n.tag),
            Some(&NodeTag::Literal("else".to_string()))
        );
        let (graph, _) = repository.find_by_start(&Token::new(0, 1, "struct")).unwrap();
        assert_eq!(graph.name(), "class");
        assert!(repository.find_by_start(&Token::new(0, 1, "\\n")).is_none());
        assert!(repository.find_by_start(&Token::new(0, 1, "return")).is_none());
    }

    #[test]
    fn test_newline_literal_in_toml() {
        let repository = GraphRepository::builtin().unwrap();
        let graph = repository.get("just_block").unwrap();
        let start = graph.start_nodes()[0];
        assert!(graph.node(start).unwrap().tag.matches(&Token::new(0, 1, "\\n")));
        let bases = repository.get("class").unwrap();
        assert!(bases
            .nodes()
            .iter()
            .any(|n| n.tag == NodeTag::Action(Action::Expression(vec!["\\n".to_string()]))));
    }

    #[test]
    fn test_misspelled_keys_are_rejected() {
        let edge = WHILE.replace("to = \"body\"", "to = \"body\"\nconditon = \"true\"");
        let err = load_graph_from_toml(&edge).unwrap_err();
        assert!(matches!(err, LoadGraphError::Toml(_)));
        assert!(err.to_string().contains("conditon"), "{err}");

        let node = WHILE.replace(
            "data = \"line_or_block\"",
            "data = \"line_or_block\"\nchek_offset = \"true\"",
        );
        let err = load_graph_from_toml(&node).unwrap_err();
        assert!(err.to_string().contains("chek_offset"), "{err}");

        let graph = WHILE.replace("name = \"while\"", "name = \"while\"\nstart = \"while\"");
        assert!(load_graph_from_toml(&graph).is_err());
    }

    #[test]
    fn test_duplicate_start_is_rejected() {
        let mut repository = GraphRepository::builtin().unwrap();
        let clash = WHILE.replace("name = \"while\"", "name = \"loop\"");
        let err = repository
            .insert(load_graph_from_toml(&clash).unwrap())
            .unwrap_err();
        assert_eq!(err.to_string(), "graphs `while` and `loop` both start with `while`");
    }

    #[test]
    fn test_same_name_replaces() {
        let mut repository = GraphRepository::builtin().unwrap();
        let before = repository.len();
        repository.insert(load_graph_from_toml(WHILE).unwrap()).unwrap();
        assert_eq!(repository.len(), before);
        assert_eq!(repository.get("while").unwrap().len(), 2);
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("while.toml"), WHILE).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a graph").unwrap();
        let mut repository = GraphRepository::new();
        assert_eq!(repository.load_dir(dir.path()).unwrap(), 1);
        assert!(repository.get("while").is_some());
    }

    #[test]
    fn test_load_dir_reports_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.toml"), "name = ").unwrap();
        let mut repository = GraphRepository::new();
        assert!(matches!(
            repository.load_dir(dir.path()),
            Err(LoadGraphError::Toml(_))
        ));
    }
}
