//! Declaration modifiers: ordering, spacing and the naming trigger.

use super::{Matcher, Visibility};
use crate::token::TokenKind;
use crate::types::Category;

/// Modifier groups in the order they must appear.
const MODIFIER_GROUPS: &[&[&str]] = &[
    &["public", "private", "protected", "internal", "file"],
    &["abstract", "virtual"],
    &["static"],
    &["sealed"],
    &["override"],
    &["new"],
    &["extern"],
    &["unsafe"],
    &["readonly"],
    &["volatile"],
];

fn group_of(value: &str) -> Option<usize> {
    MODIFIER_GROUPS.iter().position(|group| group.contains(&value))
}

impl Matcher<'_> {
    /// Rank of the modifier at `index`, if the token is used as one.
    ///
    /// A modifier is followed by whitespace and then a name or keyword on
    /// the same line. `new` counts only after another modifier.
    fn modifier_rank(&self, index: usize) -> Option<usize> {
        let token = self.token(index)?;
        let rank = group_of(&token.value)?;
        if token.value == "new" && self.prev_modifier_rank.is_none() {
            return None;
        }
        if !self.token(index + 1).is_some_and(|t| t.is_blank()) {
            return None;
        }
        let next = self.token(self.skip_blanks_from(index + 1))?;
        matches!(next.kind, TokenKind::Identifier | TokenKind::Keyword).then_some(rank)
    }

    pub(super) fn at_modifier(&self) -> bool {
        self.modifier_rank(self.cursor).is_some()
    }

    /// Consumes a run of modifiers with their separating spaces.
    pub(super) fn check_modifiers(&mut self) {
        while let Some(rank) = self.modifier_rank(self.cursor) {
            let Some(token) = self.current() else { return };
            if let Some(prev) = self.prev_modifier_rank.filter(|prev| rank < *prev) {
                let expected = MODIFIER_GROUPS[prev].join("|");
                self.report(
                    token,
                    Category::LanguageAndUnnecessaryCode,
                    format!("Wrong modifiers order: '{}' after '{expected}'", token.value),
                    format!("'{}' first", token.value),
                );
            }
            self.prev_modifier_rank = Some(rank);
            match token.value.as_str() {
                "public" => self.naming = Some(Visibility::Public),
                "private" => self.naming = Some(Visibility::Private),
                _ => {}
            }
            self.advance();
            self.check_single_space();
        }
    }

    /// Expects exactly one space at the cursor and consumes any blanks.
    pub(super) fn check_single_space(&mut self) {
        let mut count = 0;
        while let Some(token) = self.current().filter(|t| t.is_blank()) {
            if count > 0 || !token.is_space() {
                self.expected(token, " ");
            }
            count += 1;
            self.advance();
        }
        if count == 0 {
            if let Some(token) = self.current() {
                self.expected(token, " ");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{lint, messages};
    use super::*;

    #[test]
    fn test_groups() {
        assert_eq!(group_of("protected"), Some(0));
        assert_eq!(group_of("readonly"), Some(8));
        assert_eq!(group_of("const"), None);
    }

    #[test]
    fn test_ordered_modifiers_are_clean() {
        let found = lint("public static readonly int Max = 1;\nprivate static new int count;\n");
        assert!(found.is_empty(), "{found:#?}");
    }

    #[test]
    fn test_wrong_order() {
        let found = lint("static public int Max = 1;\n");
        assert_eq!(found.len(), 1, "{found:#?}");
        assert_eq!(found[0].category, Category::LanguageAndUnnecessaryCode);
        assert_eq!(found[0].column_index, 7);
        assert_eq!(
            found[0].message,
            "Wrong modifiers order: 'public' after 'static'"
        );
    }

    #[test]
    fn test_extra_space_between_modifiers() {
        let found = lint("public  static int Max = 1;\n");
        assert_eq!(messages(&found), ["1: Expected ' ', but was ' '"]);
        assert_eq!(found[0].column_index, 7);
    }

    #[test]
    fn test_new_expression_is_not_a_modifier() {
        assert!(lint("new Foo();\n").is_empty());
    }

    #[test]
    fn test_modifier_word_as_name() {
        assert!(lint("file = Open();\n").is_empty());
    }
}
