//! Tokens command implementation.

use anyhow::{bail, Context, Result};
use miette::{NamedSource, Report};
use sharplint_core::tokenize;
use std::path::Path;

use crate::config_resolver::ConfigSource;

/// Prints one token per line: line, column, kind and escaped value.
pub fn run(file: &Path, source: &ConfigSource) -> Result<()> {
    let config = source.load()?;
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let tokenized = match tokenize(&content, &config.style) {
        Ok(tokenized) => tokenized,
        Err(e) => {
            let name = file.display().to_string();
            let report = Report::new(e).with_source_code(NamedSource::new(name, content));
            bail!("{report:?}");
        }
    };

    for token in &tokenized.tokens {
        println!(
            "{:>4}:{:<4} {:<12} '{}'",
            token.line_index, token.start_index, token.kind, token.value
        );
    }
    println!(
        "\n{} tokens, {} comment lines",
        tokenized.tokens.len(),
        tokenized.lines_with_comments.len()
    );

    Ok(())
}
