//! Lexical scanner.
//!
//! The scanner walks the escaped rendering of a source file (see
//! [`crate::token::escape`]) one character at a time with a short
//! lookahead and produces the full token sequence eagerly, together with
//! the comment and line-length bookkeeping the engine needs.
//!
//! Tokens are immutable once emitted, with one exception: closing a
//! generic bracket reclassifies the `<` (and any nested `>`) emitted
//! earlier in the same statement from operator to punctuation.

use crate::config::StyleSettings;
use crate::token::{escape, Token, TokenKind, ESCAPES, OPERATORS, PUNCTUATION};
use crate::types::source_offset;
use miette::{Diagnostic, SourceSpan};
use std::collections::BTreeSet;

const SUPPRESS_OFF: &str = "LINTER:OFF";
const SUPPRESS_ON: &str = "LINTER:ON";

/// Letters that may follow the digits of a numeric literal.
const NUMBER_LETTERS: &[char] = &['e', 'E', 'f', 'F', 'l', 'L', 'd', 'D', 'm', 'M', 'u', 'U'];

/// Errors raised while scanning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
pub enum TokenizeError {
    /// A character that belongs to no lexical category.
    #[error("unexpected character '{ch}' at line {line}, column {column} (near \"{excerpt}\")")]
    #[diagnostic(code(sharplint::unexpected_char))]
    UnexpectedChar {
        /// The offending character.
        ch: char,
        /// Line number (1-based).
        line: usize,
        /// Column in the escaped line.
        column: usize,
        /// Up to ten characters either side.
        excerpt: String,
        /// Byte range of the character in the unescaped source.
        #[label("not part of any token")]
        span: SourceSpan,
    },
}

/// Scanner output for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokenized {
    /// Tokens in source order.
    pub tokens: Vec<Token>,
    /// Source lines in escaped form, without their line breaks.
    pub lines: Vec<String>,
    /// Lines that carry a comment, a directive, or suppressed text.
    pub lines_with_comments: BTreeSet<usize>,
    /// `(line, effective length)` for every line over the hard-wrap limit.
    pub too_long_lines: Vec<(usize, usize)>,
}

/// Tokenizes a whole source file.
///
/// # Errors
///
/// Returns [`TokenizeError::UnexpectedChar`] if a character outside a
/// comment or literal matches no lexical category.
pub fn tokenize(source: &str, settings: &StyleSettings) -> Result<Tokenized, TokenizeError> {
    Tokenizer::new(source, settings).run()
}

/// Single-pass scanner over an escaped character buffer.
pub struct Tokenizer<'a> {
    source: &'a str,
    settings: &'a StyleSettings,
    chars: Vec<char>,
    lines: Vec<String>,
    pos: usize,
    line: usize,
    column: usize,
    pending: String,
    pending_start: usize,
    tokens: Vec<Token>,
    lines_with_comments: BTreeSet<usize>,
    suppressed: BTreeSet<usize>,
}

impl<'a> Tokenizer<'a> {
    /// Prepares a scanner for `source`.
    #[must_use]
    pub fn new(source: &'a str, settings: &'a StyleSettings) -> Self {
        Self {
            source,
            settings,
            chars: escape(source).chars().collect(),
            lines: source.split('\n').map(escape).collect(),
            pos: 0,
            line: 1,
            column: 0,
            pending: String::new(),
            pending_start: 0,
            tokens: Vec::new(),
            lines_with_comments: BTreeSet::new(),
            suppressed: BTreeSet::new(),
        }
    }

    /// Scans the buffer to the end.
    ///
    /// # Errors
    ///
    /// See [`tokenize`].
    pub fn run(mut self) -> Result<Tokenized, TokenizeError> {
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            if ch.is_alphabetic() || ch == '_' || (!self.pending.is_empty() && ch.is_ascii_digit())
            {
                if self.pending.is_empty() {
                    self.pending_start = self.column;
                }
                self.pending.push(ch);
                self.bump(1);
                continue;
            }
            self.flush_pending();

            if ch == '#' && self.at_line_start() {
                self.lines_with_comments.insert(self.line);
                let start = self.column;
                self.skip_to_line_end();
                self.collapse_to_newline(start);
                continue;
            }
            if self.read_comment()
                || self.read_whitespace()
                || self.read_punctuation()
                || self.read_operator()
                || self.read_literal()?
                || self.read_number()
            {
                continue;
            }
            return Err(self.unexpected());
        }
        self.flush_pending();

        let too_long_lines = self.too_long_lines();
        Ok(Tokenized {
            tokens: self.tokens,
            lines: self.lines,
            lines_with_comments: self.lines_with_comments,
            too_long_lines,
        })
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn bump(&mut self, width: usize) {
        self.pos += width;
        self.column += width;
    }

    fn slice(&self, width: usize) -> String {
        let end = (self.pos + width).min(self.chars.len());
        self.chars[self.pos..end].iter().collect()
    }

    fn emit(&mut self, width: usize) {
        let value = self.slice(width);
        self.tokens.push(Token::new(self.column, self.line, value));
        self.bump(width);
    }

    fn flush_pending(&mut self) {
        if !self.pending.is_empty() {
            let value = std::mem::take(&mut self.pending);
            self.tokens
                .push(Token::new(self.pending_start, self.line, value));
        }
    }

    /// Width of the line-break escape at the cursor, if any.
    fn newline_width(&self) -> Option<usize> {
        match (self.peek(0), self.peek(1)) {
            (Some('\\'), Some('n')) => Some(2),
            (Some('\\'), Some('r')) if self.peek(2) == Some('\\') && self.peek(3) == Some('n') => {
                Some(4)
            }
            _ => None,
        }
    }

    fn break_line(&mut self, width: usize) {
        self.pos += width;
        self.line += 1;
        self.column = 0;
    }

    fn at_line_start(&self) -> bool {
        self.lines
            .get(self.line - 1)
            .map(|line| line.chars().take(self.column).collect::<String>())
            .is_some_and(|prefix| prefix.replace("\\t", "").trim().is_empty())
    }

    /// Advances to the line-break escape ending the current line.
    fn skip_to_line_end(&mut self) {
        while self.pos < self.chars.len() && self.newline_width().is_none() {
            let width = if self.chars[self.pos] == '\\' { 2 } else { 1 };
            self.bump(width);
        }
    }

    /// Consumes the line break after a comment as a single newline token
    /// positioned where the comment started.
    fn collapse_to_newline(&mut self, start: usize) {
        if let Some(width) = self.newline_width() {
            let value = self.slice(width);
            self.tokens.push(Token::new(start, self.line, value));
            self.break_line(width);
        }
    }

    // ────────────────────────────────────────────────────────────────
    // Comments
    // ────────────────────────────────────────────────────────────────

    fn read_comment(&mut self) -> bool {
        if self.peek(0) != Some('/') {
            return false;
        }
        match self.peek(1) {
            Some('/') => {
                self.read_line_comment();
                true
            }
            Some('*') => {
                self.read_block_comment();
                true
            }
            _ => false,
        }
    }

    fn read_line_comment(&mut self) {
        self.lines_with_comments.insert(self.line);
        let starts_region = self
            .lines
            .get(self.line - 1)
            .map(|line| line.chars().skip(self.column).collect::<String>())
            .is_some_and(|rest| rest.contains(SUPPRESS_OFF));
        if starts_region {
            self.skip_suppressed_region();
            return;
        }
        let start = self.column;
        self.skip_to_line_end();
        self.collapse_to_newline(start);
    }

    /// Skips everything from a `LINTER:OFF` comment through the end of
    /// the matching `LINTER:ON` line, whose line break is left for the
    /// regular scan. Without a matching marker the rest of the file is
    /// skipped.
    fn skip_suppressed_region(&mut self) {
        let off = self.line;
        let last = (off + 1..=self.lines.len())
            .find(|&n| self.lines[n - 1].contains(SUPPRESS_ON))
            .unwrap_or(self.lines.len());
        for n in off..=last {
            self.lines_with_comments.insert(n);
            self.suppressed.insert(n);
        }
        loop {
            self.skip_to_line_end();
            if self.line >= last {
                break;
            }
            match self.newline_width() {
                Some(width) => self.break_line(width),
                None => break,
            }
        }
    }

    fn read_block_comment(&mut self) {
        let (start, line) = (self.column, self.line);
        self.lines_with_comments.insert(self.line);
        self.bump(2);
        while self.pos < self.chars.len() {
            if let Some(width) = self.newline_width() {
                self.break_line(width);
                self.lines_with_comments.insert(self.line);
            } else if self.peek(0) == Some('*') && self.peek(1) == Some('/') {
                self.bump(2);
                break;
            } else {
                let width = if self.chars[self.pos] == '\\' { 2 } else { 1 };
                self.bump(width);
            }
        }
        self.tokens.push(Token::new(start, line, "\\n"));
    }

    // ────────────────────────────────────────────────────────────────
    // Whitespace, punctuation, operators
    // ────────────────────────────────────────────────────────────────

    fn read_whitespace(&mut self) -> bool {
        let ch = self.chars[self.pos];
        if ch == '\\' {
            if let Some(width) = self.newline_width() {
                let value = self.slice(width);
                self.tokens.push(Token::new(self.column, self.line, value));
                self.break_line(width);
                return true;
            }
            if ESCAPES.contains(&self.slice(2).as_str()) {
                self.emit(2);
                return true;
            }
            return false;
        }
        if ch.is_whitespace() {
            self.emit(1);
            return true;
        }
        false
    }

    fn read_punctuation(&mut self) -> bool {
        let ch = self.chars[self.pos];
        let next = self.peek(1);
        match ch {
            '<' => {
                if next == Some('<') {
                    self.emit(2);
                    return true;
                }
                false
            }
            '>' => {
                if next == Some('=') {
                    return false;
                }
                if self.close_angle(self.tokens.len()) {
                    self.tokens.push(Token::with_kind(
                        self.column,
                        self.line,
                        ">",
                        TokenKind::Punctuation,
                    ));
                    self.bump(1);
                    return true;
                }
                if next == Some('>') {
                    self.emit(2);
                    return true;
                }
                false
            }
            '?' if next == Some('?') => false,
            _ => {
                if PUNCTUATION.contains(&ch.to_string().as_str()) {
                    self.emit(1);
                    return true;
                }
                false
            }
        }
    }

    /// Looks back from `end` for the `<` a `>` would close.
    ///
    /// The scan stops at statement and group boundaries and at any other
    /// operator. On success the `<` becomes punctuation; an earlier
    /// unresolved `>` is retried recursively so nested brackets resolve
    /// together.
    fn close_angle(&mut self, end: usize) -> bool {
        let mut i = end;
        while i > 0 {
            i -= 1;
            let value = self.tokens[i].value.clone();
            let kind = self.tokens[i].kind;
            if matches!(value.as_str(), ";" | "{" | "}" | "(" | ")") {
                return false;
            }
            if kind == TokenKind::Punctuation {
                continue;
            }
            match value.as_str() {
                "<" => {
                    let opens = self.tokens[..i]
                        .iter()
                        .rev()
                        .find(|t| t.kind != TokenKind::Whitespace)
                        .is_some_and(|t| t.value == "," || t.kind == TokenKind::Identifier);
                    if opens {
                        self.tokens[i].kind = TokenKind::Punctuation;
                    }
                    return opens;
                }
                ">" => {
                    if !self.close_angle(i) {
                        return false;
                    }
                    self.tokens[i].kind = TokenKind::Punctuation;
                }
                _ if kind == TokenKind::Operator => return false,
                _ => {}
            }
        }
        false
    }

    fn read_operator(&mut self) -> bool {
        if OPERATORS.contains(&self.slice(2).as_str()) {
            self.emit(2);
            return true;
        }
        if OPERATORS.contains(&self.slice(1).as_str()) {
            self.emit(1);
            return true;
        }
        false
    }

    // ────────────────────────────────────────────────────────────────
    // Literals
    // ────────────────────────────────────────────────────────────────

    /// Reads a string or char literal, with any run of `$`/`@` prefixes.
    ///
    /// The literal ends at the next matching quote; escaped quotes are
    /// not recognised.
    fn read_literal(&mut self) -> Result<bool, TokenizeError> {
        let mut prefix = 0;
        while matches!(self.peek(prefix), Some('$' | '@')) {
            prefix += 1;
        }
        match self.peek(prefix) {
            Some(quote @ ('"' | '\'')) => {
                let mut end = self.pos + prefix + 1;
                while end < self.chars.len() && self.chars[end] != quote {
                    end += 1;
                }
                let width = (end + 1).min(self.chars.len()) - self.pos;
                self.emit(width);
                Ok(true)
            }
            _ if prefix > 0 => Err(self.unexpected()),
            _ => Ok(false),
        }
    }

    fn read_number(&mut self) -> bool {
        if !self.chars[self.pos].is_ascii_digit() {
            return false;
        }
        let mut width = 0;
        while let Some(ch) = self.peek(width) {
            let decimal_point =
                ch == '.' && self.peek(width + 1).is_some_and(|c| c.is_ascii_digit());
            if ch.is_ascii_digit() || decimal_point || NUMBER_LETTERS.contains(&ch) {
                width += 1;
            } else {
                break;
            }
        }
        self.emit(width);
        true
    }

    fn unexpected(&self) -> TokenizeError {
        let from = self.pos.saturating_sub(10);
        let to = (self.pos + 10).min(self.chars.len());
        let ch = self.chars[self.pos];
        let offset = source_offset(self.source, self.line, self.column);
        let width = self.source[offset..].chars().next().map_or(0, char::len_utf8);
        TokenizeError::UnexpectedChar {
            ch,
            line: self.line,
            column: self.column,
            excerpt: self.chars[from..to].iter().collect(),
            span: SourceSpan::from((offset, width)),
        }
    }

    fn too_long_lines(&self) -> Vec<(usize, usize)> {
        let tab_width = self.settings.indent_size;
        self.source
            .split('\n')
            .enumerate()
            .filter_map(|(i, raw)| {
                let number = i + 1;
                if self.suppressed.contains(&number) {
                    return None;
                }
                let raw = raw.strip_suffix('\r').unwrap_or(raw);
                let width: usize = raw
                    .chars()
                    .map(|c| if c == '\t' { tab_width } else { 1 })
                    .sum();
                (width > self.settings.hard_wrap_at).then_some((number, width))
            })
            .collect()
    }
}
