//! Token model shared by the tokenizer and the rule engine.

use serde::Serialize;
use std::fmt;

/// Reserved words of the language.
pub const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Operators, two-character spellings first.
pub const OPERATORS: &[&str] = &[
    "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=",
    "^=", "<<", ">>", "=>", "??", "+", "-", "*", "/", "%", "=", "<", ">", "!", "&", "|", "^",
    "~",
];

/// Single-character punctuation.
pub const PUNCTUATION: &[&str] = &[";", ":", ",", ".", "(", ")", "[", "]", "{", "}", "<", ">", "?"];

/// Escape spellings that stand in for control characters and backslashes.
pub const ESCAPES: &[&str] = &["\\n", "\\t", "\\r", "\\\\", "\\'", "\\\"", "\\f", "\\v"];

/// Lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Names and numeric literals.
    Identifier,
    /// Reserved words.
    Keyword,
    /// String and character literals.
    Literal,
    /// Operators, including `<`/`>` outside generic brackets.
    Operator,
    /// Separators and brackets.
    Punctuation,
    /// Blanks, tabs and line breaks.
    Whitespace,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Identifier => "identifier",
            Self::Keyword => "keyword",
            Self::Literal => "literal",
            Self::Operator => "operator",
            Self::Punctuation => "punctuation",
            Self::Whitespace => "whitespace",
        };
        f.write_str(name)
    }
}

impl TokenKind {
    /// Classifies a lexeme using the static tables.
    ///
    /// Precedence is keyword, operator, punctuation, literal, whitespace,
    /// and anything left over is an identifier. Numbers land in the
    /// identifier bucket.
    #[must_use]
    pub fn classify(value: &str) -> Self {
        if KEYWORDS.contains(&value) {
            Self::Keyword
        } else if OPERATORS.contains(&value) {
            Self::Operator
        } else if PUNCTUATION.contains(&value) {
            Self::Punctuation
        } else if value.contains('"')
            || value.contains('\'')
            || OPERATORS.iter().any(|op| value.contains(op))
        {
            Self::Literal
        } else if is_whitespace_lexeme(value) {
            Self::Whitespace
        } else {
            Self::Identifier
        }
    }
}

fn is_whitespace_lexeme(value: &str) -> bool {
    (!value.is_empty() && value.chars().all(char::is_whitespace))
        || matches!(value, "\\n" | "\\t" | "\\r" | "\\r\\n")
}

/// One lexeme with its source position.
///
/// Columns count characters of the escaped line, so a tab occupies two
/// columns (`\t`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Column within the line (0-based).
    pub start_index: usize,
    /// Line number (1-based).
    pub line_index: usize,
    /// Exact lexeme text in escaped form.
    pub value: String,
    /// Lexical class.
    pub kind: TokenKind,
}

impl Token {
    /// Creates a token and derives its kind from the value.
    #[must_use]
    pub fn new(start_index: usize, line_index: usize, value: impl Into<String>) -> Self {
        let value = value.into();
        let kind = TokenKind::classify(&value);
        Self {
            start_index,
            line_index,
            value,
            kind,
        }
    }

    /// Creates a token with an explicit kind.
    #[must_use]
    pub fn with_kind(
        start_index: usize,
        line_index: usize,
        value: impl Into<String>,
        kind: TokenKind,
    ) -> Self {
        Self {
            start_index,
            line_index,
            value: value.into(),
            kind,
        }
    }

    /// Returns true for a line break (`\n` or `\r\n`).
    #[must_use]
    pub fn is_newline(&self) -> bool {
        matches!(self.value.as_str(), "\\n" | "\\r\\n")
    }

    /// Returns true for whitespace that is not a line break.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.kind == TokenKind::Whitespace && !self.is_newline()
    }

    /// Returns true for an indentation tab.
    #[must_use]
    pub fn is_tab(&self) -> bool {
        self.value == "\\t"
    }

    /// Returns true for a single space.
    #[must_use]
    pub fn is_space(&self) -> bool {
        self.value == " "
    }

    /// Returns the raw source text this token stands for.
    #[must_use]
    pub fn unescaped(&self) -> String {
        unescape(&self.value)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {} '{}'",
            self.line_index, self.start_index, self.kind, self.value
        )
    }
}

/// Renders source text into the escaped form the tokenizer scans.
///
/// Control characters become their two-character spelling and a
/// backslash is doubled so the escape is reversible.
#[must_use]
pub fn escape(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for ch in source.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '\u{c}' => out.push_str("\\f"),
            '\u{b}' => out.push_str("\\v"),
            _ => out.push(ch),
        }
    }
    out
}

/// Reverses [`escape`].
#[must_use]
pub fn unescape(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
