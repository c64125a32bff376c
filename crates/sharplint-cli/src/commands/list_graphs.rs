//! List graphs command implementation.

use anyhow::{Context, Result};
use sharplint_core::{Analyzer, REQUIRED_GRAPHS};
use std::path::Path;

use crate::config_resolver::ConfigSource;

/// Runs the list-graphs command.
///
/// The graph set is built the way `check` builds it for the same path, so
/// a relative `[graphs] dir` resolves against that path.
pub fn run(path: &Path, source: &ConfigSource) -> Result<()> {
    let config = source.load()?;
    let analyzer = Analyzer::builder()
        .root(path)
        .config(config)
        .build()
        .context("Failed to load graphs")?;
    if let Some(dir) = analyzer.graph_dir() {
        println!("Graphs from {} override the built-in set\n", dir.display());
    }

    println!("{:<14} {:<7} Entry lexemes", "Graph", "Nodes");
    println!("{}", "-".repeat(60));

    for graph in analyzer.linter().graphs().iter() {
        let entries: Vec<String> = graph
            .start_lexemes()
            .map(|lexeme| format!("'{lexeme}'"))
            .collect();
        let note = if REQUIRED_GRAPHS.contains(&graph.name()) {
            " (entered by name)"
        } else {
            ""
        };
        println!(
            "{:<14} {:<7} {}{note}",
            graph.name(),
            graph.len(),
            entries.join(", ")
        );
    }

    Ok(())
}
