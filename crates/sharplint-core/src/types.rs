//! Core types for style mismatches and results.

use crate::token::escape;
use miette::{Diagnostic, SourceSpan};
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::path::PathBuf;

/// Rule family a mismatch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    /// Language usage and unnecessary code (CR).
    LanguageAndUnnecessaryCode,
    /// Whitespace, indentation and line breaks (FR).
    Formatting,
    /// Naming conventions (NR).
    Naming,
    /// Everything else (OR).
    Other,
}

impl Category {
    /// Short code used in compact output.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::LanguageAndUnnecessaryCode => "CR",
            Self::Formatting => "FR",
            Self::Naming => "NR",
            Self::Other => "OR",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One recorded style violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    /// Rule family.
    pub category: Category,
    /// The offending line, escaped.
    pub line_text: String,
    /// Column of the offending token in the escaped line.
    pub column_index: usize,
    /// Line number (1-based).
    pub line_number: usize,
    /// Human-readable description.
    pub message: String,
    /// What the engine expected to find.
    pub expected: String,
}

impl Mismatch {
    /// Renders the caret view used by text reports.
    #[must_use]
    pub fn render(&self) -> String {
        let prefix = format!("index = {} Line {}: ", self.column_index, self.line_number);
        let pad = " ".repeat(prefix.chars().count() + self.column_index);
        format!("{prefix}{}\n{pad}^\n{}", self.line_text, self.message)
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Converts a Mismatch to a miette Diagnostic for rich error display.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("[{code}] {message}")]
pub struct MismatchDiagnostic {
    code: &'static str,
    message: String,
    #[help]
    help: Option<String>,
    #[label("here")]
    span: SourceSpan,
}

impl MismatchDiagnostic {
    /// Builds a diagnostic pointing into `source`, the unescaped file text.
    #[must_use]
    pub fn new(mismatch: &Mismatch, source: &str) -> Self {
        let offset = source_offset(source, mismatch.line_number, mismatch.column_index);
        let length = source[offset..]
            .chars()
            .next()
            .map_or(0, char::len_utf8);
        Self {
            code: mismatch.category.code(),
            message: mismatch.message.clone(),
            help: Some(format!("expected {}", mismatch.expected)),
            span: SourceSpan::from((offset, length)),
        }
    }
}

/// Maps an escaped column on a line to a byte offset in the raw source.
#[must_use]
pub fn source_offset(source: &str, line_number: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line_number.saturating_sub(1))
        .map(str::len)
        .sum();
    let line = source[line_start..].split('\n').next().unwrap_or_default();
    let mut escaped = 0;
    for (byte, ch) in line.char_indices() {
        if escaped >= column {
            return line_start + byte;
        }
        escaped += escape(ch.encode_utf8(&mut [0; 4])).chars().count();
    }
    line_start + line.len()
}

/// Mismatches found in one file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileReport {
    /// File path as given to the analyzer.
    pub path: PathBuf,
    /// Mismatches in the order they were found.
    pub mismatches: Vec<Mismatch>,
}

impl FileReport {
    /// Formats the report section: banner, rendered mismatches, separator.
    #[must_use]
    pub fn format_section(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "===== {} =====", self.path.display());
        for mismatch in &self.mismatches {
            let _ = writeln!(out, "{}\n", mismatch.render());
        }
        let _ = writeln!(out, "{}", "-".repeat(40));
        out
    }
}

/// A file that could not be analyzed.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    /// File path.
    pub path: PathBuf,
    /// What went wrong.
    pub error: String,
}

/// Result of analyzing a batch of files.
#[derive(Debug, Default, Serialize)]
pub struct LintResult {
    /// Per-file mismatch lists, in analysis order.
    pub files: Vec<FileReport>,
    /// Files that failed to tokenize or read.
    pub failures: Vec<FileFailure>,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files analyzed, failed ones included.
    #[must_use]
    pub fn files_checked(&self) -> usize {
        self.files.len() + self.failures.len()
    }

    /// Total mismatches across all files.
    #[must_use]
    pub fn mismatch_count(&self) -> usize {
        self.files.iter().map(|f| f.mismatches.len()).sum()
    }

    /// Returns true if any mismatch or failure was recorded.
    #[must_use]
    pub fn has_findings(&self) -> bool {
        self.mismatch_count() > 0 || !self.failures.is_empty()
    }

    /// Counts mismatches per category, in declaration order.
    #[must_use]
    pub fn count_by_category(&self) -> [(Category, usize); 4] {
        let mut counts = [
            (Category::LanguageAndUnnecessaryCode, 0),
            (Category::Formatting, 0),
            (Category::Naming, 0),
            (Category::Other, 0),
        ];
        for mismatch in self.files.iter().flat_map(|f| &f.mismatches) {
            if let Some(slot) = counts.iter_mut().find(|(c, _)| *c == mismatch.category) {
                slot.1 += 1;
            }
        }
        counts
    }

    /// Adds files and failures from another result.
    pub fn extend(&mut self, other: Self) {
        self.files.extend(other.files);
        self.failures.extend(other.failures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_mismatch(category: Category) -> Mismatch {
        Mismatch {
            category,
            line_text: "\\tint  a;".to_string(),
            column_index: 6,
            line_number: 3,
            message: "Expected no whitespace, but was ' '".to_string(),
            expected: "no whitespace".to_string(),
        }
    }

    // --- Mismatch tests ---

    #[test]
    fn render_places_caret_under_column() {
        let rendered = make_mismatch(Category::Formatting).render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "index = 6 Line 3: \\tint  a;");
        assert_eq!(lines[1].len(), "index = 6 Line 3: ".len() + 6 + 1);
        assert!(lines[1].ends_with('^'));
        assert_eq!(&lines[0][lines[1].len() - 1..lines[1].len()], " ");
        assert_eq!(lines[2], "Expected no whitespace, but was ' '");
    }

    #[test]
    fn category_codes() {
        assert_eq!(Category::LanguageAndUnnecessaryCode.code(), "CR");
        insta::assert_snapshot!(Category::Naming.to_string(), @"NR");
    }

    #[test]
    fn source_offset_maps_escaped_columns() {
        let source = "a\n\tint  a;\n";
        // `\t` is two escaped columns wide.
        assert_eq!(source_offset(source, 2, 0), 2);
        assert_eq!(source_offset(source, 2, 2), 3);
        assert_eq!(source_offset(source, 2, 6), 7);
        assert_eq!(source_offset(source, 9, 0), source.len());
    }

    #[test]
    fn diagnostic_points_at_token() {
        let mismatch = Mismatch {
            line_number: 2,
            ..make_mismatch(Category::Formatting)
        };
        let diagnostic = MismatchDiagnostic::new(&mismatch, "a\n\tint  a;\n");
        assert_eq!(diagnostic.span.offset(), 7);
        assert_eq!(diagnostic.span.len(), 1);
        assert_eq!(diagnostic.to_string(), "[FR] Expected no whitespace, but was ' '");
    }

    // --- LintResult tests ---

    #[test]
    fn counts_and_findings() {
        let mut result = LintResult::new();
        assert!(!result.has_findings());
        result.files.push(FileReport {
            path: PathBuf::from("A.cs"),
            mismatches: vec![
                make_mismatch(Category::Formatting),
                make_mismatch(Category::Naming),
                make_mismatch(Category::Formatting),
            ],
        });
        result.failures.push(FileFailure {
            path: PathBuf::from("B.cs"),
            error: "boom".to_string(),
        });
        assert_eq!(result.files_checked(), 2);
        assert_eq!(result.mismatch_count(), 3);
        assert_eq!(result.count_by_category()[1], (Category::Formatting, 2));
        assert_eq!(result.count_by_category()[2], (Category::Naming, 1));
        assert!(result.has_findings());
    }

    #[test]
    fn format_section_has_banner_and_separator() {
        let report = FileReport {
            path: PathBuf::from("src/A.cs"),
            mismatches: vec![make_mismatch(Category::Formatting)],
        };
        let section = report.format_section();
        assert!(section.starts_with("===== src/A.cs =====\n"));
        assert!(section.contains("index = 6 Line 3:"));
        assert!(section.trim_end().ends_with(&"-".repeat(40)));
    }
}
