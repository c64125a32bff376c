//! Indentation and line-break discipline.

use super::Matcher;
use crate::config::IndentStyle;
use crate::token::Token;
use crate::types::Category;

impl Matcher<'_> {
    /// Runs the checks due at the start of a line: whitespace-only lines
    /// are skipped, then the indentation of the first real line is checked.
    pub(super) fn start_line(&mut self) {
        self.skip_blank_lines();
        self.check_offset();
    }

    /// Skips empty and whitespace-only lines. Each whitespace-only line is
    /// reported once.
    pub(super) fn skip_blank_lines(&mut self) {
        loop {
            let end = self.skip_blanks_from(self.cursor);
            match self.token(end) {
                Some(token) if token.is_newline() => {
                    if end > self.cursor {
                        self.report_whitespace_line();
                    }
                    self.cursor = end + 1;
                }
                None => {
                    if end > self.cursor {
                        self.report_whitespace_line();
                    }
                    self.cursor = end;
                    return;
                }
                Some(_) => return,
            }
        }
    }

    fn report_whitespace_line(&mut self) {
        let Some(first) = self.current() else { return };
        if self.trailing_exempt(first) {
            return;
        }
        self.report(
            first,
            Category::Formatting,
            "Useless trailing whitespace",
            "\\n",
        );
    }

    /// Whether whitespace on `token`'s line goes unreported.
    fn trailing_exempt(&self, token: &Token) -> bool {
        !self.settings.trim_trailing_whitespace
            || self.lines_with_comments.contains(&token.line_index)
    }

    /// Reports every blank in `from..to` as trailing whitespace.
    pub(super) fn report_trailing(&mut self, from: usize, to: usize) {
        for index in from..to {
            let Some(token) = self.token(index) else { break };
            if self.trailing_exempt(token) {
                return;
            }
            self.report(
                token,
                Category::Formatting,
                "Useless trailing whitespace",
                "\\n",
            );
        }
    }

    /// Consumes the indentation at the cursor and compares it with the
    /// current offset. A line starting with `}` belongs to the outer level.
    pub(super) fn check_offset(&mut self) {
        let start = self.cursor;
        let (mut tabs, mut spaces) = (0usize, 0usize);
        while let Some(token) = self.current().filter(|t| t.is_blank()) {
            if token.is_tab() {
                tabs += 1;
            } else if token.is_space() {
                spaces += 1;
            }
            self.advance();
        }
        let Some(content) = self.current() else { return };
        if content.is_newline() {
            return;
        }

        let style = self.settings.indent_style;
        for index in start..self.cursor {
            let Some(token) = self.token(index) else { break };
            let wrong = match style {
                IndentStyle::Tab => token.is_space(),
                IndentStyle::Space => token.is_tab(),
            };
            if wrong {
                let message = match style {
                    IndentStyle::Tab => "Should use tabs instead of spaces",
                    IndentStyle::Space => "Should use spaces instead of tabs",
                };
                self.report(token, Category::Formatting, message, style.lexeme());
            }
        }
        if tabs > 0 && spaces > 0 {
            if let Some(first) = self.token(start) {
                self.report(
                    first,
                    Category::Formatting,
                    "Mixed spaces and tabs",
                    style.to_string(),
                );
            }
        }

        let level = if content.value == "}" {
            self.offset.saturating_sub(1)
        } else {
            self.offset
        };
        let size = self.settings.indent_size;
        let width = tabs * size + spaces;
        let wanted = level * size;
        if width != wanted {
            let message = if width < wanted {
                "Expected more offset"
            } else {
                "Expected less offset"
            };
            self.report(
                content,
                Category::Formatting,
                format!("{message} ({wanted} columns, but was {width})"),
                format!("{wanted} columns"),
            );
        }
    }

    /// After a statement terminator only trailing whitespace and a line
    /// break may follow. The line break itself is left in place.
    pub(super) fn check_newline_after_terminator(&mut self) {
        let start = self.cursor;
        let end = self.skip_blanks_from(start);
        match self.token(end) {
            None => self.report_trailing(start, end),
            Some(token) if token.is_newline() => self.report_trailing(start, end),
            Some(token) => self.expected(token, "\\n"),
        }
        self.cursor = end;
    }

    /// Handles blanks where a statement should start. Blanks before a line
    /// break are trailing whitespace; blanks before more code mean the
    /// previous construct should have ended its line.
    pub(super) fn stray_blanks(&mut self) {
        let start = self.cursor;
        let end = self.skip_blanks_from(start);
        match self.token(end) {
            Some(token) if !token.is_newline() => {
                if let Some(first) = self.token(start) {
                    self.expected(first, "\\n");
                }
            }
            _ => self.report_trailing(start, end),
        }
        self.cursor = end;
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{lint, lint_with, messages};
    use crate::config::{IndentStyle, StyleSettings};

    // --- Offset tests ---

    #[test]
    fn test_nested_offsets() {
        let source = "if (a)\n{\n\tif (b)\n\t{\n\t\tc = 1;\n\t}\n}\n";
        let found = lint(source);
        assert!(found.is_empty(), "{found:#?}");
    }

    #[test]
    fn test_more_and_less_offset() {
        let source = "if (a)\n{\nb = 1;\n\t\tc = 2;\n}\n";
        let found = lint(source);
        assert_eq!(
            messages(&found),
            [
                "3: Expected more offset (4 columns, but was 0)",
                "4: Expected less offset (4 columns, but was 8)",
            ]
        );
    }

    #[test]
    fn test_closing_brace_uses_outer_level() {
        let found = lint("if (a)\n{\n\tb = 1;\n\t}\n");
        assert_eq!(
            messages(&found),
            ["4: Expected less offset (0 columns, but was 4)"]
        );
    }

    #[test]
    fn test_spaces_under_tab_style() {
        let found = lint("if (a)\n{\n    b = 1;\n}\n");
        assert_eq!(found.len(), 4, "{found:#?}");
        assert!(found
            .iter()
            .all(|m| m.message == "Should use tabs instead of spaces" && m.expected == "\\t"));
    }

    #[test]
    fn test_tabs_under_space_style() {
        let settings = StyleSettings {
            indent_style: IndentStyle::Space,
            ..StyleSettings::default()
        };
        let found = lint_with("if (a)\n{\n\tb = 1;\n}\n", settings);
        assert_eq!(messages(&found), ["3: Should use spaces instead of tabs"]);
    }

    #[test]
    fn test_mixed_indentation() {
        let found = lint("if (a)\n{\n  \t  b = 1;\n}\n");
        let found = messages(&found);
        assert_eq!(found.len(), 6, "{found:#?}");
        assert!(found.contains(&"3: Mixed spaces and tabs".to_string()));
        assert!(found.contains(&"3: Expected less offset (4 columns, but was 8)".to_string()));
    }

    // --- Blank line tests ---

    #[test]
    fn test_whitespace_only_line() {
        let found = lint("a = 1;\n\t \nb = 2;\n");
        assert_eq!(messages(&found), ["2: Useless trailing whitespace"]);
        assert_eq!(found[0].column_index, 0);
    }

    #[test]
    fn test_empty_lines_are_fine() {
        assert!(lint("a = 1;\n\n\nb = 2;\n").is_empty());
    }

    #[test]
    fn test_trailing_whitespace_after_terminator() {
        let found = lint("a = 1;  \n");
        assert_eq!(
            messages(&found),
            ["1: Useless trailing whitespace", "1: Useless trailing whitespace"]
        );
    }

    #[test]
    fn test_comment_line_is_exempt() {
        assert!(lint("a = 1; // note\n\t// indented note\nb = 2;\n").is_empty());
    }

    #[test]
    fn test_trailing_whitespace_can_be_disabled() {
        let settings = StyleSettings {
            trim_trailing_whitespace: false,
            ..StyleSettings::default()
        };
        assert!(lint_with("a = 1;  \n \nb = 2;\n", settings).is_empty());
    }
}
