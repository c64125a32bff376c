//! # sharplint-core
//!
//! Style checking for C# sources, driven by declarative rule graphs.
//!
//! This crate provides:
//!
//! - [`tokenize`] turning source text into an escaped token stream
//! - [`GraphRepository`] holding the rule graphs, built-in or loaded from TOML
//! - [`Linter`] matching a token stream against the graphs
//! - [`Analyzer`] for linting a directory tree
//! - [`Mismatch`] for representing findings
//!
//! ## Example
//!
//! ```
//! use sharplint_core::{Linter, StyleSettings};
//!
//! let linter = Linter::with_builtin_graphs(StyleSettings::default()).unwrap();
//! let mismatches = linter.lint_source("int a = 1 ;\n").unwrap();
//! assert_eq!(mismatches.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod config;
mod linter;
mod types;

/// Rule graph model, file format and repository.
pub mod graph;
/// Token model and escaping helpers.
pub mod token;
/// Source scanner.
pub mod tokenizer;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError};
pub use config::{
    AnalyzerConfig, Config, ConfigError, GraphsConfig, IndentStyle, StyleSettings,
};
pub use graph::{GraphRepository, LoadGraphError};
pub use linter::{LintError, Linter, REQUIRED_GRAPHS};
pub use token::{Token, TokenKind};
pub use tokenizer::{tokenize, TokenizeError, Tokenized};
pub use types::{
    Category, FileFailure, FileReport, LintResult, Mismatch, MismatchDiagnostic,
};
