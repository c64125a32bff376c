//! Check command implementation.

use anyhow::{Context, Result};
use sharplint_core::Analyzer;
use std::path::Path;

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Runs the check command. Returns `false` when anything was reported.
pub fn run(
    path: &Path,
    format: OutputFormat,
    report: Option<&Path>,
    exclude: Vec<String>,
    source: &ConfigSource,
) -> Result<bool> {
    let config = source.load()?;

    let analyzer = Analyzer::builder()
        .root(path)
        .config(config)
        .excludes(exclude)
        .build()
        .context("Failed to build analyzer")?;

    tracing::info!(
        "Analyzing {:?} with {} graphs",
        path,
        analyzer.linter().graphs().len()
    );

    let result = analyzer.analyze().context("Analysis failed")?;

    super::output::print(&result, format)?;

    if let Some(report) = report {
        super::output::append_report(report, &result)
            .with_context(|| format!("Failed to write report: {}", report.display()))?;
    }

    Ok(!result.has_findings())
}
