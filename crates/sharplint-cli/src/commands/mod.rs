//! Subcommand implementations.

pub mod check;
pub mod init;
pub mod list_graphs;
pub mod output;
pub mod tokens;
