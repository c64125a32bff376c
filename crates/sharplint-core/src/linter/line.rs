//! Plain statements: declarations, assignments, calls and attributes.

use super::expression::Spacing;
use super::{LineMode, Matcher, Visibility};
use crate::token::{Token, TokenKind};
use crate::types::Category;

impl<'a> Matcher<'a> {
    /// Checks a statement no graph claims, up to its terminator.
    pub(super) fn check_line(&mut self, mode: LineMode) {
        let Some(first) = self.current() else { return };
        match first.value.as_str() {
            "}" | ")" | "]" => return,
            "[" => {
                self.check_attribute(mode);
                return;
            }
            _ => {}
        }

        let mut spacing = Spacing::default();
        let mut candidate: Option<&'a Token> = None;
        let mut depth = 0usize;
        let mut initializer = false;
        let mut closes_line = false;

        while let Some(token) = self.current() {
            let value = token.value.as_str();
            if token.is_blank() {
                self.blank_run(&mut spacing, mode.terminators, false);
                continue;
            }
            if token.is_newline() {
                if spacing.continues() {
                    self.continuation_line();
                    spacing.gap = true;
                    continue;
                }
                if !closes_line {
                    self.line_break_in_statement(mode, candidate, initializer, spacing.prev);
                }
                return;
            }
            if depth == 0 && mode.terminators.contains(&value) {
                self.fire_naming(candidate, false);
                self.advance();
                self.check_newline_after_terminator();
                return;
            }
            match value {
                "}" | ")" | "]" => {
                    self.expected(token, mode.terminators[0]);
                    return;
                }
                "{" => {
                    self.fire_naming(candidate, false);
                    let accessors = self.inline_braces();
                    closes_line = accessors || !initializer;
                    if let Some(close) = self.cursor.checked_sub(1).and_then(|i| self.token(i)) {
                        spacing.push(close);
                    }
                    continue;
                }
                "(" => self.fire_naming(candidate, true),
                "=" => {
                    self.fire_naming(candidate, false);
                    initializer = true;
                }
                "=>" => self.fire_naming(candidate, false),
                "new" | "return" => initializer = true,
                "<" if token.kind == TokenKind::Punctuation => depth += 1,
                ">" if token.kind == TokenKind::Punctuation => depth = depth.saturating_sub(1),
                _ if token.kind == TokenKind::Identifier && depth == 0 => candidate = Some(token),
                _ => {}
            }
            closes_line = false;
            self.step(&mut spacing, token);
        }
        self.expected_at_end(mode.terminators[0]);
    }

    /// A line break before the terminator: the statement continues with a
    /// braced body or initializer on the next line, or the terminator is
    /// missing.
    fn line_break_in_statement(
        &mut self,
        mode: LineMode,
        candidate: Option<&'a Token>,
        initializer: bool,
        prev: Option<&'a Token>,
    ) {
        let Some(newline) = self.current() else { return };
        let next = self.next_line_start(self.cursor);
        if next.is_some_and(|t| t.value == "{") {
            self.fire_naming(candidate, false);
            if initializer && !prev.is_some_and(|t| t.value == "=>") {
                self.initialization();
                self.terminator_after_block(mode);
            } else {
                self.just_block();
            }
            return;
        }
        if mode.open_end && next.is_some_and(|t| t.value == "}") {
            return;
        }
        self.expected(newline, mode.terminators[0]);
    }

    fn terminator_after_block(&mut self, mode: LineMode) {
        match self.current() {
            Some(token) if mode.terminators.contains(&token.value.as_str()) => {
                self.advance();
                self.check_newline_after_terminator();
            }
            Some(token) if mode.open_end && token.is_newline() => {}
            Some(token) => self.expected(token, mode.terminators[0]),
            None => self.expected_at_end(mode.terminators[0]),
        }
    }

    /// `[Attribute]` on its own line or before a declaration. No
    /// terminator follows.
    fn check_attribute(&mut self, mode: LineMode) {
        self.advance();
        self.check_expression(&["]", "\\n"]);
        if self.expect_closer("]").is_none() {
            return;
        }
        let end = self.skip_blanks_from(self.cursor);
        match self.token(end) {
            Some(token) if !token.is_newline() => {
                self.check_single_space();
                self.statement(mode);
            }
            _ => {
                self.report_trailing(self.cursor, end);
                self.cursor = end;
            }
        }
    }

    fn fire_naming(&mut self, candidate: Option<&'a Token>, callable: bool) {
        let Some(visibility) = self.naming.take() else { return };
        if let Some(token) = candidate {
            self.check_naming(token, visibility, callable);
        }
    }

    /// Public names and private methods start uppercase, private fields
    /// lowercase.
    pub(super) fn check_naming(&mut self, token: &Token, visibility: Visibility, callable: bool) {
        let upper = visibility == Visibility::Public || callable;
        let first = token.value.chars().next();
        let ok = if upper {
            first.is_some_and(char::is_uppercase)
        } else {
            first.is_some_and(|c| c.is_lowercase() || c == '_')
        };
        if ok {
            return;
        }
        let (wanted, expected) = if upper {
            ("an uppercase letter", "Uppercase")
        } else {
            ("a lowercase letter", "lowercase")
        };
        self.report(
            token,
            Category::Naming,
            format!("Expected name starting with {wanted}, but was '{}'", token.value),
            expected,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{lint, messages};
    use crate::types::Category;

    // --- Naming tests ---

    #[test]
    fn test_public_names() {
        assert!(lint("public int Count;\npublic void Run()\n{\n}\n").is_empty());
        let found = lint("public int count;\n");
        assert_eq!(
            messages(&found),
            ["1: Expected name starting with an uppercase letter, but was 'count'"]
        );
        assert_eq!(found[0].category, Category::Naming);
        assert_eq!(found[0].expected, "Uppercase");
    }

    #[test]
    fn test_private_field_and_method() {
        let source = "private int count;\nprivate int _size = 0;\nprivate void Reset()\n{\n}\n";
        let found = lint(source);
        assert!(found.is_empty(), "{found:#?}");
        let found = lint("private int Count;\nprivate void reset()\n{\n}\n");
        assert_eq!(
            messages(&found),
            [
                "1: Expected name starting with a lowercase letter, but was 'Count'",
                "2: Expected name starting with an uppercase letter, but was 'reset'",
            ]
        );
    }

    #[test]
    fn test_generic_type_is_not_the_name() {
        let found = lint("private Dictionary<string, List<int>> index = new Dictionary<string, List<int>>();\n");
        assert!(found.is_empty(), "{found:#?}");
    }

    #[test]
    fn test_naming_without_modifier_is_not_checked() {
        assert!(lint("int Count = 0;\n").is_empty());
    }

    // --- Statement tests ---

    #[test]
    fn test_missing_terminator() {
        let found = lint("a = 1\nb = 2;\n");
        assert_eq!(messages(&found), ["1: Expected ';', but was '\\n'"]);
    }

    #[test]
    fn test_space_before_terminator() {
        let found = lint("a = 1 ;\n");
        assert_eq!(messages(&found), ["1: Expected no whitespace, but was ' '"]);
    }

    #[test]
    fn test_properties() {
        let source = "public int Count { get; private set; }\npublic int Size { get; set; } = 4;\npublic string Name\n{\n\tget { return name; }\n}\n";
        let found = lint(source);
        assert!(found.is_empty(), "{found:#?}");
    }

    #[test]
    fn test_block_initializer() {
        let source = "var point = new Point\n{\n\tX = 1,\n\tY = 2\n};\n";
        let found = lint(source);
        assert!(found.is_empty(), "{found:#?}");
    }

    #[test]
    fn test_attributes() {
        let source = "[Serializable]\npublic class Item\n{\n\t[Obsolete(\"old\")] public int Id;\n}\n";
        let found = lint(source);
        assert!(found.is_empty(), "{found:#?}");
    }
}
