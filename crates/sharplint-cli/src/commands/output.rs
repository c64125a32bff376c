//! Shared output formatting for lint results.

use anyhow::Result;
use miette::{NamedSource, Report};
use sharplint_core::{LintResult, MismatchDiagnostic};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::OutputFormat;

/// Print lint results in the specified format.
pub fn print(result: &LintResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(result),
        OutputFormat::Json => return print_json(result),
        OutputFormat::Compact => print_compact(result),
        OutputFormat::Fancy => print_fancy(result),
    }
    Ok(())
}

fn print_text(result: &LintResult) {
    for file in result.files.iter().filter(|f| !f.mismatches.is_empty()) {
        print!("{}", file.format_section());
    }
    for failure in &result.failures {
        println!(
            "\x1b[31merror\x1b[0m {}: {}",
            failure.path.display(),
            failure.error
        );
    }
    print_summary(result);
}

fn print_summary(result: &LintResult) {
    let counts: Vec<String> = result
        .count_by_category()
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(category, n)| format!("{category}: {n}"))
        .collect();

    let summary_color = if !result.failures.is_empty() {
        "\x1b[31m"
    } else if result.mismatch_count() > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    let breakdown = if counts.is_empty() {
        String::new()
    } else {
        format!(" ({})", counts.join(", "))
    };
    println!(
        "{}Found {} mismatch(es){} and {} failure(s) in {} file(s)\x1b[0m",
        summary_color,
        result.mismatch_count(),
        breakdown,
        result.failures.len(),
        result.files_checked()
    );
}

fn print_json(result: &LintResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

fn print_compact(result: &LintResult) {
    for file in &result.files {
        for mismatch in &file.mismatches {
            println!(
                "{}:{}:{}: [{}] {}",
                file.path.display(),
                mismatch.line_number,
                mismatch.column_index,
                mismatch.category,
                mismatch.message,
            );
        }
    }
    for failure in &result.failures {
        println!("{}: error: {}", failure.path.display(), failure.error);
    }
}

fn print_fancy(result: &LintResult) {
    for file in result.files.iter().filter(|f| !f.mismatches.is_empty()) {
        let source = match std::fs::read_to_string(&file.path) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("Cannot re-read {}: {}", file.path.display(), e);
                continue;
            }
        };
        let name = file.path.display().to_string();
        for mismatch in &file.mismatches {
            let report = Report::new(MismatchDiagnostic::new(mismatch, &source))
                .with_source_code(NamedSource::new(&name, source.clone()));
            eprintln!("{report:?}");
        }
    }
    for failure in &result.failures {
        eprintln!("{}: {}", failure.path.display(), failure.error);
    }
    print_summary(result);
}

/// Appends one section per checked file to the report at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub fn append_report(path: &Path, result: &LintResult) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for report in &result.files {
        file.write_all(report.format_section().as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharplint_core::{Category, FileReport, Mismatch};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn result_with(path: &str, messages: &[&str]) -> LintResult {
        let mismatches = messages
            .iter()
            .map(|message| Mismatch {
                category: Category::Formatting,
                line_text: "int a=1;".to_string(),
                column_index: 5,
                line_number: 1,
                message: (*message).to_string(),
                expected: " ".to_string(),
            })
            .collect();
        let mut result = LintResult::new();
        result.files.push(FileReport {
            path: PathBuf::from(path),
            mismatches,
        });
        result
    }

    #[test]
    fn report_is_appended_per_run() {
        let tmp = TempDir::new().unwrap();
        let report = tmp.path().join("report.txt");

        append_report(&report, &result_with("A.cs", &["Expected ' ', but was '='"])).unwrap();
        append_report(&report, &result_with("B.cs", &[])).unwrap();

        let content = std::fs::read_to_string(&report).unwrap();
        assert!(content.starts_with("===== A.cs =====\n"));
        assert!(content.contains("Expected ' ', but was '='"));
        assert!(content.contains("===== B.cs =====\n"));
        assert_eq!(content.matches(&"-".repeat(40)).count(), 2);
    }

    #[test]
    fn section_for_clean_file_has_banner_and_separator() {
        let result = result_with("Clean.cs", &[]);
        let section = result.files[0].format_section();
        assert_eq!(section, format!("===== Clean.cs =====\n{}\n", "-".repeat(40)));
    }
}
