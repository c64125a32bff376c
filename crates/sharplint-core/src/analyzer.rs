//! Batch driver: file discovery and per-file linting.

use crate::config::Config;
use crate::graph::GraphRepository;
use crate::linter::{LintError, Linter};
use crate::tokenizer::TokenizeError;
use crate::types::{FileFailure, FileReport, LintResult};

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// IO error reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Source file that could not be tokenized.
    #[error("Tokenize error in {path}: {source}")]
    Tokenize {
        /// Path to the file that failed.
        path: PathBuf,
        /// Tokenizer error.
        source: TokenizeError,
    },

    /// Glob pattern error.
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// Directory walk error.
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Engine setup error.
    #[error(transparent)]
    Lint(#[from] LintError),
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    exclude_patterns: Vec<String>,
    include_patterns: Vec<String>,
    config: Option<Config>,
    graphs: Option<GraphRepository>,
    fail_on_tokenize_error: Option<bool>,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root directory to analyze.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude glob patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Adds an include glob pattern. Replaces the configured includes.
    #[must_use]
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include_patterns.push(pattern.into());
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses `graphs` instead of the built-in set plus `[graphs] dir`.
    #[must_use]
    pub fn graphs(mut self, graphs: GraphRepository) -> Self {
        self.graphs = Some(graphs);
        self
    }

    /// Sets whether a tokenizer failure aborts the batch (default: false).
    #[must_use]
    pub fn fail_on_tokenize_error(mut self, fail: bool) -> Self {
        self.fail_on_tokenize_error = Some(fail);
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be read, a glob
    /// pattern is invalid, or the graph set cannot be loaded.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let config = self.config.unwrap_or_default();
        let root = self.root.unwrap_or_else(|| config.analyzer.root.clone());
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };

        let include = if self.include_patterns.is_empty() {
            config.analyzer.include.clone()
        } else {
            self.include_patterns
        };
        let mut exclude = self.exclude_patterns;
        exclude.extend(config.analyzer.exclude.iter().cloned());

        let graph_dir = if self.graphs.is_none() {
            config.graphs.dir.as_deref().map(|dir| resolve_graph_dir(&root, dir))
        } else {
            None
        };
        let graphs = match self.graphs {
            Some(graphs) => graphs,
            None => {
                let mut graphs = GraphRepository::builtin().map_err(LintError::from)?;
                if let Some(dir) = &graph_dir {
                    let loaded = graphs.load_dir(dir).map_err(LintError::from)?;
                    debug!("Loaded {loaded} graph(s) from {}", dir.display());
                }
                graphs
            }
        };
        let linter = Linter::new(graphs, config.style.clone())?;

        Ok(Analyzer {
            root,
            graph_dir,
            include: compile(&include)?,
            exclude: compile(&exclude)?,
            respect_gitignore: config.analyzer.respect_gitignore,
            fail_on_tokenize_error: self
                .fail_on_tokenize_error
                .unwrap_or(config.analyzer.fail_on_tokenize_error),
            linter,
        })
    }
}

/// A relative graph directory is taken from the analysed directory, or
/// from the file's directory when a single file is analysed.
fn resolve_graph_dir(root: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        return dir.to_path_buf();
    }
    let base = if root.is_file() {
        root.parent().unwrap_or(root)
    } else {
        root
    };
    base.join(dir)
}

fn compile(patterns: &[String]) -> Result<Vec<glob::Pattern>, glob::PatternError> {
    patterns.iter().map(|p| glob::Pattern::new(p)).collect()
}

/// Lints every matching source file below a root directory.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    root: PathBuf,
    graph_dir: Option<PathBuf>,
    include: Vec<glob::Pattern>,
    exclude: Vec<glob::Pattern>,
    respect_gitignore: bool,
    fail_on_tokenize_error: bool,
    linter: Linter,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the root directory being analyzed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the resolved `[graphs] dir`, if one was configured.
    #[must_use]
    pub fn graph_dir(&self) -> Option<&Path> {
        self.graph_dir.as_deref()
    }

    /// Returns the engine used for each file.
    #[must_use]
    pub fn linter(&self) -> &Linter {
        &self.linter
    }

    /// Analyzes all files and returns the results.
    ///
    /// A file that fails to tokenize is recorded in
    /// [`LintResult::failures`] unless the analyzer was built to fail on
    /// it.
    ///
    /// # Errors
    ///
    /// Returns an error if file discovery or reading fails.
    pub fn analyze(&self) -> Result<LintResult, AnalyzerError> {
        info!("Starting analysis at {:?}", self.root);

        let files = self.discover_files()?;
        info!("Found {} files to analyze", files.len());

        let mut result = LintResult::new();
        for path in files {
            match self.analyze_file(&path) {
                Ok(report) => result.files.push(report),
                Err(AnalyzerError::Tokenize { path, source }) => {
                    warn!("Failed to tokenize {}: {}", path.display(), source);
                    if self.fail_on_tokenize_error {
                        return Err(AnalyzerError::Tokenize { path, source });
                    }
                    result.failures.push(FileFailure {
                        path,
                        error: source.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Analysis complete: {} mismatches in {} files",
            result.mismatch_count(),
            result.files_checked()
        );

        Ok(result)
    }

    /// Lints a single file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or tokenized.
    pub fn analyze_file(&self, path: &Path) -> Result<FileReport, AnalyzerError> {
        debug!("Analyzing: {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let mismatches =
            self.linter
                .lint_source(&content)
                .map_err(|source| AnalyzerError::Tokenize {
                    path: path.to_path_buf(),
                    source,
                })?;

        Ok(FileReport {
            path: path.to_path_buf(),
            mismatches,
        })
    }

    /// Discovers source files in sorted order. A file root is linted as is.
    fn discover_files(&self) -> Result<Vec<PathBuf>, AnalyzerError> {
        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let mut files = Vec::new();
        let walker = ignore::WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .require_git(false)
            .build();
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.into_path();
            if self.should_exclude(&path) {
                debug!("Excluding: {}", path.display());
                continue;
            }
            if self.should_include(&path) {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    fn should_include(&self, path: &Path) -> bool {
        let relative = self.relative(path);
        self.include
            .iter()
            .any(|p| p.matches_path(relative) || p.matches_path(path))
    }

    /// Checks if a path should be excluded.
    fn should_exclude(&self, path: &Path) -> bool {
        let relative = self.relative(path);
        self.exclude
            .iter()
            .any(|p| p.matches_path(relative) || p.matches_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn analyzer(dir: &TempDir) -> Analyzer {
        Analyzer::builder().root(dir.path()).build().unwrap()
    }

    // --- Builder tests ---

    #[test]
    fn test_builder() {
        let analyzer = Analyzer::builder()
            .root(".")
            .exclude("**/Generated/**")
            .build()
            .expect("Failed to build analyzer");

        assert!(analyzer.root().exists());
        assert!(analyzer.root().is_absolute());
    }

    #[test]
    fn test_exclude_patterns() {
        let analyzer = Analyzer::builder()
            .root("/repo")
            .exclude("**/Generated/**")
            .build()
            .expect("Failed to build analyzer");

        assert!(analyzer.should_exclude(Path::new("/repo/bin/Debug/App.cs")));
        assert!(analyzer.should_exclude(Path::new("/repo/obj/App.cs")));
        assert!(analyzer.should_exclude(Path::new("/repo/src/Generated/Api.cs")));
        assert!(!analyzer.should_exclude(Path::new("/repo/src/App.cs")));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Analyzer::builder()
            .exclude("[")
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, AnalyzerError::Glob(_)));
    }

    // --- Discovery tests ---

    #[test]
    fn test_discovers_sorted_sources() {
        let dir = TempDir::new().unwrap();
        write(&dir, "b/Second.cs", "int b = 2;\n");
        write(&dir, "a/First.cs", "int a = 1;\n");
        write(&dir, "notes.txt", "not code");
        write(&dir, "obj/Gen.cs", "junk");

        let files = analyzer(&dir).discover_files().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["First.cs", "Second.cs"]);
    }

    #[test]
    fn test_single_file_root() {
        let dir = TempDir::new().unwrap();
        write(&dir, "One.cs", "int a = 1;");
        let analyzer = Analyzer::builder()
            .root(dir.path().join("One.cs"))
            .build()
            .unwrap();
        let result = analyzer.analyze().unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.mismatch_count(), 1);
    }

    // --- Batch tests ---

    #[test]
    fn test_tokenize_failure_is_recorded() {
        let dir = TempDir::new().unwrap();
        write(&dir, "Bad.cs", "int a = `1`;\n");
        write(&dir, "Good.cs", "int a = 1;\n");

        let result = analyzer(&dir).analyze().unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].path.ends_with("Bad.cs"));
        assert!(result.has_findings());
        assert_eq!(result.files_checked(), 2);
    }

    #[test]
    fn test_tokenize_failure_can_abort() {
        let dir = TempDir::new().unwrap();
        write(&dir, "Bad.cs", "int a = `1`;\n");

        let err = Analyzer::builder()
            .root(dir.path())
            .fail_on_tokenize_error(true)
            .build()
            .unwrap()
            .analyze()
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Tokenize { .. }));
    }

    #[test]
    fn test_config_graph_dir_overrides_builtin() {
        let dir = TempDir::new().unwrap();
        write(&dir, "App.cs", "while(a) b();\n");
        write(
            &dir,
            "rules/while.toml",
            r#"
name = "while"

[[nodes]]
id = "while"
data = "while"

[[nodes]]
id = "rest"
data = 'expression_\n'

[[edges]]
from = "while"
to = "rest"
"#,
        );
        let mut config = Config::default();
        config.graphs.dir = Some(PathBuf::from("rules"));

        let builtin = analyzer(&dir).analyze().unwrap();
        assert_eq!(builtin.mismatch_count(), 2, "{builtin:#?}");

        let custom = Analyzer::builder()
            .root(dir.path())
            .config(config.clone())
            .build()
            .unwrap();
        assert_eq!(custom.graph_dir(), Some(dir.path().join("rules").as_path()));
        let result = custom.analyze().unwrap();
        assert_eq!(result.mismatch_count(), 0, "{result:#?}");

        let single = Analyzer::builder()
            .root(dir.path().join("App.cs"))
            .config(config)
            .build()
            .unwrap();
        assert_eq!(single.graph_dir(), Some(dir.path().join("rules").as_path()));
        assert_eq!(single.analyze().unwrap().mismatch_count(), 0);
    }
}
