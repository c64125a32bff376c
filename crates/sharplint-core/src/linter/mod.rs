//! Graph-driven style engine.
//!
//! The engine walks the token sequence of one file left to right. Plain
//! statements go through the line checker; statements whose first token
//! enters a rule graph are matched node by node, and graph actions
//! re-enter the engine for nested bodies.
//!
//! # Architecture
//!
//! ```text
//! Linter (graphs + settings, shared)
//!   ↓ lint_source() / lint_tokens()
//! Matcher (per-file cursor, offset, mismatches)
//!   ↓ analyze() → statement()
//! graph traversal | line checker
//!   ↓ actions
//! expression walker, offset checks, nested analyze()
//! ```
//!
//! The cursor only moves forward. Lookahead helpers compute indices
//! without moving it.

mod expression;
mod line;
mod modifiers;
mod offset;
mod traversal;

use std::collections::BTreeSet;

use crate::config::StyleSettings;
use crate::graph::{GraphRepository, LoadGraphError};
use crate::token::Token;
use crate::tokenizer::{tokenize, TokenizeError, Tokenized};
use crate::types::{Category, Mismatch};

/// Graph entered for a braced body.
pub const JUST_BLOCK: &str = "just_block";
/// Graph entered for one switch section.
pub const CASE: &str = "case";
/// Graph entered for a block-form initializer.
pub const INITIALIZER: &str = "initializer";

/// Graphs the engine enters by name.
pub const REQUIRED_GRAPHS: &[&str] = &[JUST_BLOCK, CASE, INITIALIZER];

/// Errors raised while setting up the engine.
#[derive(Debug, thiserror::Error)]
pub enum LintError {
    /// A graph the engine enters by name is missing.
    #[error("rule graph `{name}` not found")]
    GraphNotFound {
        /// The missing graph.
        name: String,
    },

    /// The graph set could not be loaded.
    #[error(transparent)]
    Graph(#[from] LoadGraphError),
}

/// Style checker for source files.
///
/// A `Linter` is immutable once built and can check any number of files;
/// every call gets fresh per-file state.
#[derive(Debug, Clone)]
pub struct Linter {
    graphs: GraphRepository,
    settings: StyleSettings,
}

impl Linter {
    /// Creates a linter over `graphs`.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::GraphNotFound`] if a graph from
    /// [`REQUIRED_GRAPHS`] is missing.
    pub fn new(graphs: GraphRepository, settings: StyleSettings) -> Result<Self, LintError> {
        if let Some(name) = REQUIRED_GRAPHS.iter().find(|n| graphs.get(n).is_none()) {
            return Err(LintError::GraphNotFound {
                name: (*name).to_string(),
            });
        }
        Ok(Self { graphs, settings })
    }

    /// Creates a linter over the built-in graph set.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in graphs fail to load.
    pub fn with_builtin_graphs(settings: StyleSettings) -> Result<Self, LintError> {
        Self::new(GraphRepository::builtin()?, settings)
    }

    /// The style settings in effect.
    #[must_use]
    pub fn settings(&self) -> &StyleSettings {
        &self.settings
    }

    /// The graph set in effect.
    #[must_use]
    pub fn graphs(&self) -> &GraphRepository {
        &self.graphs
    }

    /// Tokenizes and checks one source text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be tokenized.
    pub fn lint_source(&self, source: &str) -> Result<Vec<Mismatch>, TokenizeError> {
        let tokenized = tokenize(source, &self.settings)?;
        Ok(self.lint_tokens(&tokenized))
    }

    /// Checks an already tokenized file.
    #[must_use]
    pub fn lint_tokens(&self, tokenized: &Tokenized) -> Vec<Mismatch> {
        let mut matcher = Matcher::new(self, tokenized);
        matcher.run();
        matcher.mismatches
    }
}

/// Visibility that armed the naming check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visibility {
    Public,
    Private,
}

/// How the line checker ends a plain statement.
#[derive(Debug, Clone, Copy)]
struct LineMode {
    /// Lexemes that end the statement.
    terminators: &'static [&'static str],
    /// Whether the statement may also end at a line break followed by `}`.
    open_end: bool,
}

impl LineMode {
    const STATEMENT: Self = Self {
        terminators: &[";"],
        open_end: false,
    };

    const ITEMS: Self = Self {
        terminators: &[","],
        open_end: true,
    };
}

/// Per-file engine state.
struct Matcher<'a> {
    graphs: &'a GraphRepository,
    settings: &'a StyleSettings,
    tokens: &'a [Token],
    lines: &'a [String],
    lines_with_comments: &'a BTreeSet<usize>,
    too_long_lines: &'a [(usize, usize)],
    cursor: usize,
    offset: usize,
    mismatches: Vec<Mismatch>,
    prev_modifier_rank: Option<usize>,
    naming: Option<Visibility>,
}

impl<'a> Matcher<'a> {
    fn new(linter: &'a Linter, tokenized: &'a Tokenized) -> Self {
        Self {
            graphs: &linter.graphs,
            settings: &linter.settings,
            tokens: &tokenized.tokens,
            lines: &tokenized.lines,
            lines_with_comments: &tokenized.lines_with_comments,
            too_long_lines: &tokenized.too_long_lines,
            cursor: 0,
            offset: 0,
            mismatches: Vec::new(),
            prev_modifier_rank: None,
            naming: None,
        }
    }

    fn run(&mut self) {
        self.start_line();
        self.analyze(&[], LineMode::STATEMENT);
        self.check_final_newline();
        self.report_long_lines();
    }

    // ────────────────────────────────────────────────────────────────
    // Cursor
    // ────────────────────────────────────────────────────────────────

    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.cursor)
    }

    fn token(&self, index: usize) -> Option<&'a Token> {
        self.tokens.get(index)
    }

    fn advance(&mut self) {
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
    }

    fn at(&self, value: &str) -> bool {
        self.current().is_some_and(|t| t.value == value)
    }

    /// Index of the first non-blank token at or after `from`.
    fn skip_blanks_from(&self, from: usize) -> usize {
        let mut i = from;
        while self.tokens.get(i).is_some_and(Token::is_blank) {
            i += 1;
        }
        i
    }

    /// First non-blank token of the line after the line break at `index`.
    fn next_line_start(&self, index: usize) -> Option<&'a Token> {
        self.token(self.skip_blanks_from(index + 1))
    }

    // ────────────────────────────────────────────────────────────────
    // Reporting
    // ────────────────────────────────────────────────────────────────

    fn report(
        &mut self,
        token: &Token,
        category: Category,
        message: impl Into<String>,
        expected: impl Into<String>,
    ) {
        let line_text = self
            .lines
            .get(token.line_index.saturating_sub(1))
            .cloned()
            .unwrap_or_default();
        self.mismatches.push(Mismatch {
            category,
            line_text,
            column_index: token.start_index,
            line_number: token.line_index,
            message: message.into(),
            expected: expected.into(),
        });
    }

    /// Records `Expected '<expected>', but was '<token>'`.
    fn expected(&mut self, token: &Token, expected: &str) {
        self.report(
            token,
            Category::Formatting,
            format!("Expected '{expected}', but was '{}'", token.value),
            expected,
        );
    }

    /// Records a missing `expected` at the last token of the file.
    fn expected_at_end(&mut self, expected: &str) {
        let Some(last) = self.tokens.last() else { return };
        self.report(
            last,
            Category::Formatting,
            format!("Expected '{expected}', but was end of file"),
            expected,
        );
    }

    // ────────────────────────────────────────────────────────────────
    // Top level
    // ────────────────────────────────────────────────────────────────

    /// Checks statements until a token in `stops` or the end of input.
    fn analyze(&mut self, stops: &[&str], mode: LineMode) {
        while let Some(token) = self.current() {
            if token.is_newline() {
                self.advance();
                self.start_line();
                continue;
            }
            if stops.contains(&token.value.as_str()) {
                return;
            }
            if token.is_blank() {
                self.stray_blanks();
                continue;
            }
            let before = self.cursor;
            self.statement(mode);
            if self.cursor == before {
                self.expected(token, "statement");
                self.advance();
            }
        }
    }

    /// Checks one statement starting at the cursor.
    fn statement(&mut self, mode: LineMode) {
        if self.at_modifier() {
            self.check_modifiers();
        }
        self.prev_modifier_rank = None;
        if let Some(token) = self.current() {
            let graphs = self.graphs;
            match graphs.find_by_start(token) {
                Some((graph, start)) => self.check_tokens_by_graph(graph, start),
                None => self.check_line(mode),
            }
        }
        self.naming = None;
    }

    fn check_final_newline(&mut self) {
        if !self.settings.insert_final_newline {
            return;
        }
        if let Some(last) = self.tokens.last().filter(|t| !t.is_newline()) {
            self.report(
                last,
                Category::Formatting,
                "Expected line break at end of file",
                "\\n",
            );
        }
    }

    fn report_long_lines(&mut self) {
        let limit = self.settings.hard_wrap_at;
        for &(line, length) in self.too_long_lines {
            let line_text = self
                .lines
                .get(line.saturating_sub(1))
                .cloned()
                .unwrap_or_default();
            self.mismatches.push(Mismatch {
                category: Category::Other,
                line_text,
                column_index: 0,
                line_number: line,
                message: format!("Line is too long ({length} > {limit})"),
                expected: format!("at most {limit} columns"),
            });
        }
    }
}
