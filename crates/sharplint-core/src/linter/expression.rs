//! Expression spacing.
//!
//! The walker checks whitespace between tokens up to a stop lexeme.
//! Parenthesised groups recurse and inline braces delegate to the
//! initializer check. A line break is only allowed after a continuation
//! operator, and the continued line is indented one level deeper.

use super::Matcher;
use crate::token::{Token, TokenKind};
use crate::types::Category;

/// Operators a line may end with inside an expression.
const CONTINUATIONS: &[&str] = &["||", "&&", "|", "&", ","];

/// Lexemes that take no whitespace before them.
const NO_SPACE_BEFORE: &[&str] = &[",", ";", ")", "]", "."];

/// Keywords that open an accessor list.
const ACCESSORS: &[&str] = &[
    "get", "set", "init", "add", "remove", "private", "protected", "internal",
];

/// Spacing state across the tokens of one walk.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Spacing<'a> {
    /// Last significant token.
    pub(super) prev: Option<&'a Token>,
    /// Significant token before `prev`.
    before_prev: Option<&'a Token>,
    /// Whitespace seen since `prev`.
    pub(super) gap: bool,
}

impl<'a> Spacing<'a> {
    pub(super) fn push(&mut self, token: &'a Token) {
        self.before_prev = self.prev;
        self.prev = Some(token);
        self.gap = false;
    }

    /// Whether the last significant token continues the line.
    pub(super) fn continues(&self) -> bool {
        self.prev
            .is_some_and(|t| CONTINUATIONS.contains(&t.value.as_str()))
    }
}

pub(super) fn is_stop(token: &Token, stops: &[&str]) -> bool {
    stops
        .iter()
        .any(|s| *s == token.value || (*s == "\\n" && token.is_newline()))
}

fn needs_space(a: &Token, b: &Token) -> bool {
    use TokenKind::{Identifier, Keyword, Literal, Operator};
    matches!(
        (a.kind, b.kind),
        (Operator, Identifier | Keyword | Literal) | (Identifier | Keyword | Literal, Operator)
    )
}

/// A name directly followed by its argument list. `var (a, b)` is a
/// deconstruction, not a call.
fn is_call_target(token: &Token) -> bool {
    token.kind == TokenKind::Identifier && token.value != "var"
}

fn is_step(token: &Token) -> bool {
    matches!(token.value.as_str(), "++" | "--")
}

/// Whether `op` is a prefix operator, judged by the token before it.
fn is_unary(before: Option<&Token>, op: &Token) -> bool {
    match op.value.as_str() {
        "!" | "~" => true,
        "-" | "+" => !before.is_some_and(|t| {
            matches!(t.kind, TokenKind::Identifier | TokenKind::Literal)
                || matches!(t.value.as_str(), ")" | "]")
        }),
        _ => false,
    }
}

impl<'a> Matcher<'a> {
    /// Checks an expression up to (not including) one of `stops`.
    pub(super) fn check_expression(&mut self, stops: &[&str]) {
        self.walk(stops, false);
    }

    /// With `padded`, exactly one space is expected before the stop.
    fn walk(&mut self, stops: &[&str], padded: bool) {
        let mut spacing = Spacing::default();
        while let Some(token) = self.current() {
            if is_stop(token, stops) {
                return;
            }
            if token.is_blank() {
                self.blank_run(&mut spacing, stops, padded);
                continue;
            }
            if token.is_newline() {
                if spacing.continues() {
                    self.continuation_line();
                } else {
                    self.expected(token, stops.first().copied().unwrap_or(")"));
                    self.advance();
                    self.cursor = self.skip_blanks_from(self.cursor);
                }
                spacing.gap = true;
                continue;
            }
            self.step(&mut spacing, token);
        }
    }

    /// Checks and consumes one significant token, descending into groups.
    pub(super) fn step(&mut self, spacing: &mut Spacing<'a>, token: &'a Token) {
        self.check_adjacent(spacing, token);
        spacing.push(token);
        match token.value.as_str() {
            "(" => {
                self.advance();
                if let Some(close) = self.group(")") {
                    spacing.push(close);
                }
            }
            "[" => {
                self.advance();
                if let Some(close) = self.group("]") {
                    spacing.push(close);
                }
            }
            "{" => {
                self.initialization();
                if let Some(close) = self.cursor.checked_sub(1).and_then(|i| self.token(i)) {
                    spacing.push(close);
                }
            }
            "," => {
                self.advance();
                // `[,]` and `[,,]` are rank specifiers.
                if let Some(next) = self.current().filter(|t| {
                    t.kind != TokenKind::Whitespace && !matches!(t.value.as_str(), "]" | ",")
                }) {
                    self.expected(next, " ");
                }
            }
            _ => self.advance(),
        }
    }

    /// Walks a bracketed group whose opener was just consumed and consumes
    /// the closer.
    pub(super) fn group(&mut self, close: &str) -> Option<&'a Token> {
        self.check_expression(&[close, ";", "}"]);
        self.expect_closer(close)
    }

    pub(super) fn expect_closer(&mut self, close: &str) -> Option<&'a Token> {
        match self.current() {
            Some(token) if token.value == close => {
                self.advance();
                Some(token)
            }
            Some(token) => {
                self.expected(token, close);
                None
            }
            None => {
                self.expected_at_end(close);
                None
            }
        }
    }

    /// Handles a run of blanks inside an expression.
    pub(super) fn blank_run(&mut self, spacing: &mut Spacing<'a>, stops: &[&str], padded: bool) {
        let start = self.cursor;
        let end = self.skip_blanks_from(start);
        self.cursor = end;
        spacing.gap = true;
        let Some(next) = self.token(end).filter(|t| !t.is_newline()) else {
            self.report_trailing(start, end);
            return;
        };
        let Some(prev) = spacing.prev else {
            self.unwanted_whitespace(start, end);
            return;
        };
        let stop = is_stop(next, stops);
        if padded && stop {
            self.check_padding(start, end);
        } else if stop
            || NO_SPACE_BEFORE.contains(&next.value.as_str())
            || prev.value == "."
            || (next.value == "(" && is_call_target(prev))
        {
            self.unwanted_whitespace(start, end);
        } else {
            self.check_padding(start, end);
        }
    }

    fn unwanted_whitespace(&mut self, from: usize, to: usize) {
        for index in from..to {
            if let Some(token) = self.token(index) {
                self.report(
                    token,
                    Category::Formatting,
                    format!("Expected no whitespace, but was '{}'", token.value),
                    "no whitespace",
                );
            }
        }
    }

    /// Exactly one space is allowed in `from..to`.
    fn check_padding(&mut self, from: usize, to: usize) {
        for (nth, index) in (from..to).enumerate() {
            if let Some(token) = self.token(index) {
                if nth > 0 || !token.is_space() {
                    self.expected(token, " ");
                }
            }
        }
    }

    /// Two significant tokens with nothing between them.
    fn check_adjacent(&mut self, spacing: &Spacing<'a>, token: &'a Token) {
        if spacing.gap {
            return;
        }
        let Some(prev) = spacing.prev else { return };
        if !needs_space(prev, token) || is_step(prev) || is_step(token) {
            return;
        }
        if is_unary(spacing.before_prev, prev) {
            return;
        }
        self.expected(token, " ");
    }

    /// Continues an expression on the next line, one level deeper.
    pub(super) fn continuation_line(&mut self) {
        self.offset += 1;
        self.advance();
        self.start_line();
        self.offset -= 1;
    }

    /// Checks `{ ... }` on one line, cursor at `{`. Returns true when the
    /// braces hold an accessor list (`{ get; set; }`).
    pub(super) fn inline_braces(&mut self) -> bool {
        self.advance();
        if self.at("}") {
            self.advance();
            return false;
        }
        let accessor = self
            .token(self.skip_blanks_from(self.cursor))
            .is_some_and(|t| ACCESSORS.contains(&t.value.as_str()));
        self.check_single_space();
        self.walk(&["}"], true);
        match self.current() {
            Some(close) => {
                let padded = self
                    .cursor
                    .checked_sub(1)
                    .and_then(|i| self.token(i))
                    .is_some_and(Token::is_blank);
                if !padded {
                    self.expected(close, " ");
                }
                self.advance();
            }
            None => self.expected_at_end("}"),
        }
        accessor
    }
}
