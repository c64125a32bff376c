//! Graph traversal and the action dispatch table.

use super::{LineMode, Matcher, CASE, INITIALIZER, JUST_BLOCK};
use crate::graph::model::{Action, NodeId, NodeTag, OffsetPolicy, RuleGraph};
use crate::token::{Token, TokenKind};
use crate::types::Category;

/// Lexemes that end a fall-through switch section.
const SECTION_ENDS: &[&str] = &["case", "default", "}"];

impl<'a> Matcher<'a> {
    /// Matches the construct starting at the cursor against `graph`,
    /// entering at `start`, which matches the current token.
    pub(super) fn check_tokens_by_graph(&mut self, graph: &'a RuleGraph, start: NodeId) {
        self.consume_literal(graph, start);
        self.traverse(graph, start);
    }

    /// Enters `graph` at whichever start node matches the cursor.
    fn enter_graph(&mut self, graph: &'a RuleGraph) {
        while let Some(token) = self.current().filter(|t| t.is_blank()) {
            self.expected(token, &graph_entry(graph));
            self.advance();
        }
        let Some(token) = self.current() else {
            self.expected_at_end(&graph_entry(graph));
            return;
        };
        if let Some(start) = graph.start_for(token) {
            self.check_tokens_by_graph(graph, start);
            return;
        }
        self.expected(token, &graph_entry(graph));
        if let Some(&start) = graph.start_nodes().first() {
            self.traverse(graph, start);
        }
    }

    fn enter_named(&mut self, name: &str) {
        let graphs = self.graphs;
        if let Some(graph) = graphs.get(name) {
            self.enter_graph(graph);
        }
    }

    /// Consumes the token matched by literal `node` and runs the hooks for
    /// line breaks and terminators.
    fn consume_literal(&mut self, graph: &RuleGraph, node: NodeId) {
        let Some(token) = self.current() else { return };
        self.advance();
        let policy = graph.node(node).map(|n| n.check_offset).unwrap_or_default();
        if token.is_newline() {
            if policy == OffsetPolicy::Skip {
                self.skip_blank_lines();
            } else {
                self.start_line();
            }
        } else if token.value == ";" && !graph.has_literal_successor(node) {
            self.check_newline_after_terminator();
        }
    }

    fn traverse(&mut self, graph: &'a RuleGraph, start: NodeId) {
        let mut node = start;
        let mut last: Option<bool> = None;
        let mut idle = 0;
        loop {
            let before = self.cursor;
            let candidates: Vec<NodeId> = graph
                .successors(node)
                .filter(|(_, condition)| condition.admits(last))
                .map(|(to, _)| to)
                .collect();
            let Some(&first) = candidates.first() else {
                return;
            };

            let mut moved = false;
            for &to in &candidates {
                let Some(target) = graph.node(to) else { continue };
                match &target.tag {
                    NodeTag::End => return,
                    NodeTag::Action(action) => {
                        last = self.dispatch(action);
                        if target.check_offset == OffsetPolicy::Check {
                            self.check_offset();
                        }
                        node = to;
                        moved = true;
                        break;
                    }
                    NodeTag::Literal(_) => {
                        if self.current().is_some_and(|t| target.tag.matches(t)) {
                            self.consume_literal(graph, to);
                            node = to;
                            moved = true;
                            break;
                        }
                    }
                }
            }

            if !moved {
                let wanted = graph
                    .node(first)
                    .map(|n| n.tag.to_string())
                    .unwrap_or_default();
                match self.current() {
                    None => {
                        self.expected_at_end(&wanted);
                        return;
                    }
                    Some(token) if token.is_newline() => {
                        self.advance();
                        self.start_line();
                    }
                    Some(token) => {
                        self.expected(token, &wanted);
                        if token.is_blank() {
                            self.advance();
                        } else {
                            node = first;
                        }
                    }
                }
            }

            if self.cursor == before {
                idle += 1;
                if idle > graph.len() {
                    return;
                }
            } else {
                idle = 0;
            }
        }
    }

    /// Runs one action. The result gates conditional edges.
    fn dispatch(&mut self, action: &Action) -> Option<bool> {
        match action {
            Action::Expression(stops) => {
                let stops: Vec<&str> = stops.iter().map(String::as_str).collect();
                self.check_expression(&stops);
                None
            }
            Action::Identifier => self.identifier(),
            Action::Type => self.type_placeholder(),
            Action::Line => {
                self.statement(LineMode::STATEMENT);
                None
            }
            Action::Block => {
                self.analyze(&["}"], LineMode::STATEMENT);
                None
            }
            Action::BlockComma => {
                self.analyze(&["}"], LineMode::ITEMS);
                None
            }
            Action::CaseBlock => self.case_block(),
            Action::SwitchBlock => {
                self.switch_block();
                None
            }
            Action::IncreaseOffset => {
                self.offset += 1;
                None
            }
            Action::DecreaseOffset => {
                self.offset = self.offset.saturating_sub(1);
                None
            }
            Action::LineOrBlock => self.line_or_block(),
            Action::JustBlock => {
                self.just_block();
                None
            }
            Action::Initialization => self.initialization(),
            Action::CatchFilter => Some(self.catch_filter()),
        }
    }

    // ────────────────────────────────────────────────────────────────
    // Actions
    // ────────────────────────────────────────────────────────────────

    /// A braced body starting at the line break before `{`.
    pub(super) fn just_block(&mut self) {
        self.enter_named(JUST_BLOCK);
    }

    /// A braced body or a single statement on the next line, indented one
    /// level. Returns true for the braced form.
    fn line_or_block(&mut self) -> Option<bool> {
        let end = self.skip_blanks_from(self.cursor);
        let next = self.token(end)?;
        if next.value == "{" {
            self.cursor = end;
            self.just_block();
            return Some(true);
        }
        if next.is_newline() {
            self.report_trailing(self.cursor, end);
            self.cursor = end;
            if self.next_line_start(end).is_some_and(|t| t.value == "{") {
                self.just_block();
                return Some(true);
            }
            self.offset += 1;
            self.advance();
            self.start_line();
            self.statement(LineMode::STATEMENT);
            self.offset -= 1;
            return Some(false);
        }
        self.expected(next, "\\n");
        self.cursor = end;
        self.statement(LineMode::STATEMENT);
        Some(false)
    }

    /// Statements of a switch section, from the line break after its label
    /// up to a `break`/`return` or the line holding the next label. Returns
    /// true when the section ends with a jump.
    fn case_block(&mut self) -> Option<bool> {
        while let Some(token) = self.current() {
            if token.is_newline() {
                let next = self.next_code(self.cursor);
                if next.is_some_and(|t| SECTION_ENDS.contains(&t.value.as_str())) {
                    return Some(false);
                }
                self.advance();
                self.start_line();
                continue;
            }
            match token.value.as_str() {
                "break" | "return" => return Some(true),
                "case" | "default" | "}" => return Some(false),
                _ if token.is_blank() => self.stray_blanks(),
                _ => {
                    let before = self.cursor;
                    self.statement(LineMode::STATEMENT);
                    if self.cursor == before {
                        self.expected(token, "statement");
                        self.advance();
                    }
                }
            }
        }
        Some(false)
    }

    /// First token after `from` that is neither blank nor a line break.
    fn next_code(&self, from: usize) -> Option<&'a Token> {
        self.tokens
            .iter()
            .skip(from + 1)
            .find(|t| t.kind != TokenKind::Whitespace)
    }

    /// Switch sections up to the closing `}`.
    fn switch_block(&mut self) {
        while let Some(token) = self.current() {
            match token.value.as_str() {
                "}" => return,
                "case" | "default" => {
                    self.enter_named(CASE);
                }
                _ if token.is_newline() => {
                    self.advance();
                    self.start_line();
                }
                _ if token.is_blank() => self.stray_blanks(),
                _ => {
                    self.expected(token, "case");
                    let before = self.cursor;
                    self.statement(LineMode::STATEMENT);
                    if self.cursor == before {
                        self.advance();
                    }
                }
            }
        }
    }

    /// A dotted name, optionally with generic parameters.
    fn identifier(&mut self) -> Option<bool> {
        while let Some(token) = self.current().filter(|t| t.is_blank()) {
            self.report(
                token,
                Category::Formatting,
                format!("Expected no whitespace, but was '{}'", token.value),
                "no whitespace",
            );
            self.advance();
        }
        let Some(name) = self.current() else {
            self.expected_at_end("identifier");
            return None;
        };
        if name.kind != TokenKind::Identifier {
            self.expected(name, "identifier");
            return None;
        }
        if let Some(visibility) = self.naming.take() {
            self.check_naming(name, visibility, true);
        }
        while self.current().is_some_and(|t| {
            t.kind == TokenKind::Identifier || t.value == "."
        }) {
            self.advance();
        }
        if self.current().is_some_and(|t| {
            t.value == "<" && t.kind == TokenKind::Punctuation
        }) {
            self.advance();
            self.check_expression(&[">", "\\n"]);
            self.expect_closer(">");
        }
        None
    }

    /// `var` in a `foreach` header.
    fn type_placeholder(&mut self) -> Option<bool> {
        self.cursor = self.skip_blanks_from(self.cursor);
        if self.at("var") {
            self.advance();
            Some(true)
        } else {
            Some(false)
        }
    }

    /// Whether the catch clause names an exception. Does not move the
    /// cursor.
    fn catch_filter(&self) -> bool {
        self.token(self.skip_blanks_from(self.cursor))
            .is_some_and(|t| t.value == "(")
    }

    /// An object or collection initializer at the cursor: inline braces on
    /// this line (true) or a block on the next line (false).
    pub(super) fn initialization(&mut self) -> Option<bool> {
        let token = self.current()?;
        if token.value == "{" {
            self.inline_braces();
            return Some(true);
        }
        if token.is_newline() && self.next_line_start(self.cursor).is_some_and(|t| t.value == "{")
        {
            self.enter_named(INITIALIZER);
            return Some(false);
        }
        None
    }
}

/// First entry lexeme of `graph`, for mismatch text.
fn graph_entry(graph: &RuleGraph) -> String {
    graph
        .start_nodes()
        .first()
        .and_then(|&id| graph.node(id))
        .map(|n| n.tag.to_string())
        .unwrap_or_default()
}
