//! Integration test: fixture sources end-to-end through the linter and
//! the batch analyzer.
//!
//! Fixtures live under `tests/fixtures/`: clean files per construct
//! family, real-world sources in both indentation styles, one file per
//! construct with known mistakes, a tab/space pair and a batch containing
//! a file the tokenizer rejects.

use sharplint_core::{
    Analyzer, Category, IndentStyle, Linter, Mismatch, StyleSettings,
};
use std::path::PathBuf;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_root().join(name)).expect("fixture should exist")
}

fn lint_fixture(name: &str, settings: StyleSettings) -> Vec<Mismatch> {
    Linter::with_builtin_graphs(settings)
        .expect("built-in graphs should load")
        .lint_source(&read_fixture(name))
        .expect("fixture should tokenize")
}

fn messages(found: &[Mismatch]) -> Vec<String> {
    found
        .iter()
        .map(|m| format!("{}: {}", m.line_number, m.message))
        .collect()
}

fn space_settings() -> StyleSettings {
    StyleSettings {
        indent_style: IndentStyle::Space,
        ..StyleSettings::default()
    }
}

// ── Clean sources ──

#[test]
fn clean_fixtures_have_no_mismatches() {
    for name in ["clean/Inventory.cs", "clean/Flow.cs"] {
        let found = lint_fixture(name, StyleSettings::default());
        assert!(found.is_empty(), "{name}: {found:#?}");
    }
}

#[test]
fn real_world_tab_sources_are_clean() {
    for name in [
        "clean/DiskTree.cs",
        "clean/Tickets.cs",
        "clean/Antiplagiarism.cs",
        "clean/Counter.cs",
        "clean/methods/Solve.cs",
        "clean/methods/ProcessPath.cs",
        "clean/methods/PrintTree.cs",
    ] {
        let found = lint_fixture(name, StyleSettings::default());
        assert!(found.is_empty(), "{name}: {found:#?}");
    }
}

#[test]
fn real_world_space_sources_are_clean() {
    for name in ["spaces/MovingAverage.cs", "spaces/Sum.cs", "spaces/Suppressed.cs"] {
        let found = lint_fixture(name, space_settings());
        assert!(found.is_empty(), "{name}: {found:#?}");
    }
}

// ── Known mistakes ──

#[test]
fn detects_every_mistake() {
    let found = lint_fixture("mistakes/WithMistakes.cs", StyleSettings::default());

    // 1. naming: class `sample`
    // 2. naming: private field `Count`
    // 3-4. `a=1`: missing spaces around `=`
    // 5. whitespace before `;`
    // 6. `if(`: missing space
    // 7. modifier order `static public`
    // 8-9. two trailing spaces
    assert_eq!(found.len(), 9, "{found:#?}");

    let lines: Vec<usize> = found.iter().map(|m| m.line_number).collect();
    assert_eq!(lines, [1, 3, 6, 6, 7, 8, 10, 11, 11]);

    let count = |category| found.iter().filter(|m| m.category == category).count();
    assert_eq!(count(Category::Naming), 2);
    assert_eq!(count(Category::LanguageAndUnnecessaryCode), 1);
    assert_eq!(count(Category::Formatting), 6);
}

#[test]
fn renders_caret_under_column() {
    let found = lint_fixture("mistakes/WithMistakes.cs", StyleSettings::default());
    insta::assert_snapshot!(found[0].render(), @r"
    index = 13 Line 1: public class sample
                                    ^
    Expected name starting with an uppercase letter, but was 'sample'
    ");
}

// ── Mistakes per construct ──

fn construct_messages(name: &str) -> Vec<String> {
    messages(&lint_fixture(
        &format!("constructs/{name}"),
        StyleSettings::default(),
    ))
}

#[test]
fn switch_mistakes() {
    assert_eq!(
        construct_messages("Switch.cs"),
        [
            "1: Expected ' ', but was '('",
            "6: Expected no whitespace, but was ' '",
            "10: Expected no whitespace, but was ' '",
        ]
    );
}

#[test]
fn try_catch_mistakes() {
    assert_eq!(
        construct_messages("TryCatch.cs"),
        [
            "5: Expected ' ', but was '('",
            "12: Should use tabs instead of spaces",
            "12: Mixed spaces and tabs",
            "12: Expected less offset (4 columns, but was 5)",
        ]
    );
}

#[test]
fn do_while_mistakes() {
    assert_eq!(
        construct_messages("DoWhile.cs"),
        [
            "4: Expected ' ', but was 'while'",
            "8: Expected ';', but was ' '",
        ]
    );
}

#[test]
fn for_mistakes() {
    assert_eq!(
        construct_messages("For.cs"),
        [
            "1: Expected ' ', but was 'i'",
            "3: Expected '\\n', but was 'Use'",
        ]
    );
}

#[test]
fn foreach_mistakes() {
    assert_eq!(
        construct_messages("Foreach.cs"),
        [
            "1: Expected 'in', but was ' '",
            "5: Expected more offset (4 columns, but was 0)",
        ]
    );
}

#[test]
fn class_naming_mistakes() {
    let found = lint_fixture("constructs/Class.cs", StyleSettings::default());
    assert!(found.iter().all(|m| m.category == Category::Naming), "{found:#?}");
    assert_eq!(
        messages(&found),
        [
            "1: Expected name starting with an uppercase letter, but was 'inventory'",
            "3: Expected name starting with a lowercase letter, but was 'Count'",
        ]
    );
}

#[test]
fn namespace_mistakes() {
    assert_eq!(
        construct_messages("Namespace.cs"),
        [
            "3: Expected more offset (4 columns, but was 0)",
            "4: Expected more offset (4 columns, but was 0)",
            "5: Expected more offset (4 columns, but was 0)",
            "7: Expected no whitespace, but was ' '",
        ]
    );
}

#[test]
fn enum_mistakes() {
    assert_eq!(
        construct_messages("Enum.cs"),
        ["4: Expected no whitespace, but was ' '"]
    );
}

// ── Indentation style ──

#[test]
fn tab_and_space_twins_are_both_clean() {
    let tabs = lint_fixture("offsets/Tabs.cs", StyleSettings::default());
    assert!(tabs.is_empty(), "{tabs:#?}");

    let spaces = lint_fixture("offsets/Spaces.cs", space_settings());
    assert!(spaces.is_empty(), "{spaces:#?}");
}

#[test]
fn wrong_indent_character_is_reported_per_token() {
    let tabs = lint_fixture("offsets/Tabs.cs", space_settings());
    assert_eq!(tabs.len(), 24, "{tabs:#?}");
    assert!(tabs
        .iter()
        .all(|m| m.message == "Should use spaces instead of tabs"));

    let spaces = lint_fixture("offsets/Spaces.cs", StyleSettings::default());
    assert_eq!(spaces.len(), 96, "{spaces:#?}");
    assert!(spaces
        .iter()
        .all(|m| m.message == "Should use tabs instead of spaces"));
}

// ── Suppression ──

#[test]
fn suppressed_region_is_skipped() {
    let found = lint_fixture("suppression/Suppressed.cs", StyleSettings::default());
    assert!(found.is_empty(), "{found:#?}");
}

// ── Batch ──

#[test]
fn batch_continues_past_tokenizer_failure() {
    let analyzer = Analyzer::builder()
        .root(fixture_root().join("batch"))
        .build()
        .expect("analyzer should build");
    let result = analyzer.analyze().expect("analysis should succeed");

    let names: Vec<String> = result
        .files
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["Good.cs", "Styled.cs"]);
    assert_eq!(result.failures.len(), 1, "{:#?}", result.failures);
    assert!(result.failures[0].path.ends_with("Broken.cs"));
    assert!(result.failures[0].error.contains('`'));
    assert_eq!(result.mismatch_count(), 2, "{result:#?}");
    assert_eq!(result.files_checked(), 3);
}

#[test]
fn analyzer_lints_fixture_tree() {
    let analyzer = Analyzer::builder()
        .root(fixture_root())
        .exclude("**/batch/**")
        .exclude("**/offsets/Spaces.cs")
        .exclude("**/spaces/**")
        .exclude("**/constructs/**")
        .build()
        .expect("analyzer should build");
    let result = analyzer.analyze().expect("analysis should succeed");

    assert!(result.failures.is_empty(), "{:#?}", result.failures);
    assert_eq!(result.files.len(), 12);
    assert_eq!(result.mismatch_count(), 9, "{result:#?}");
}
