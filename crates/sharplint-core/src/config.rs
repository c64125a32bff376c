//! Configuration types for sharplint.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// Top-level configuration for sharplint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Formatting expectations.
    #[serde(default)]
    pub style: StyleSettings,

    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Extra rule graph definitions.
    #[serde(default)]
    pub graphs: GraphsConfig,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// Style keys are read one by one: a value of the wrong type or out of
    /// range is skipped with a warning and the default stays in place.
    /// The `[analyzer]` and `[graphs]` tables are strict.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;

        let analyzer = match table.get("analyzer") {
            Some(value) => value
                .clone()
                .try_into()
                .map_err(|e: toml::de::Error| ConfigError::Parse {
                    message: format!("[analyzer]: {e}"),
                })?,
            None => AnalyzerConfig::default(),
        };
        let graphs = match table.get("graphs") {
            Some(value) => value
                .clone()
                .try_into()
                .map_err(|e: toml::de::Error| ConfigError::Parse {
                    message: format!("[graphs]: {e}"),
                })?,
            None => GraphsConfig::default(),
        };

        Ok(Self {
            style: StyleSettings::from_table(&table),
            analyzer,
            graphs,
        })
    }
}

/// Indentation character expected at line starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndentStyle {
    /// One tab per level.
    #[default]
    Tab,
    /// `indent_size` spaces per level.
    Space,
}

impl IndentStyle {
    /// The whitespace lexeme this style indents with.
    #[must_use]
    pub fn lexeme(self) -> &'static str {
        match self {
            Self::Tab => "\\t",
            Self::Space => " ",
        }
    }
}

impl fmt::Display for IndentStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tab => write!(f, "tab"),
            Self::Space => write!(f, "space"),
        }
    }
}

impl FromStr for IndentStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tab" | "tabs" => Ok(Self::Tab),
            "space" | "spaces" => Ok(Self::Space),
            other => Err(format!("unknown indent style '{other}'")),
        }
    }
}

/// Formatting expectations consumed by the tokenizer and the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSettings {
    /// Tabs or spaces.
    pub indent_style: IndentStyle,
    /// Columns per indentation level.
    pub indent_size: usize,
    /// Longest allowed line, tabs expanded.
    pub hard_wrap_at: usize,
    /// Require a line break at the end of the file.
    pub insert_final_newline: bool,
    /// Report whitespace-only lines and whitespace before line breaks.
    pub trim_trailing_whitespace: bool,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            indent_style: IndentStyle::Tab,
            indent_size: 4,
            hard_wrap_at: 120,
            insert_final_newline: true,
            trim_trailing_whitespace: true,
        }
    }
}

impl StyleSettings {
    /// Reads style keys from a parsed document.
    ///
    /// Keys may sit at the top level or under `[style]`; the latter wins.
    #[must_use]
    pub fn from_table(table: &toml::Table) -> Self {
        let mut settings = Self::default();
        settings.apply(table);
        if let Some(style) = table.get("style").and_then(toml::Value::as_table) {
            settings.apply(style);
        }
        settings
    }

    fn apply(&mut self, table: &toml::Table) {
        for (key, value) in table {
            match key.as_str() {
                "indent_style" => match value.as_str().map(str::parse::<IndentStyle>) {
                    Some(Ok(style)) => self.indent_style = style,
                    _ => skip(key, value),
                },
                "indent_size" => match positive(value) {
                    Some(size) => self.indent_size = size,
                    None => skip(key, value),
                },
                "hard_wrap_at" => match positive(value) {
                    Some(limit) => self.hard_wrap_at = limit,
                    None => skip(key, value),
                },
                "insert_final_newline" => match value.as_bool() {
                    Some(flag) => self.insert_final_newline = flag,
                    None => skip(key, value),
                },
                "trim_trailing_whitespace" => match value.as_bool() {
                    Some(flag) => self.trim_trailing_whitespace = flag,
                    None => skip(key, value),
                },
                _ => {}
            }
        }
    }
}

fn positive(value: &toml::Value) -> Option<usize> {
    value
        .as_integer()
        .and_then(|n| usize::try_from(n).ok())
        .filter(|n| *n >= 1)
}

fn skip(key: &str, value: &toml::Value) {
    warn!("Ignoring invalid value for '{}': {}", key, value);
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Root directory to analyze (default: current directory).
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Glob patterns selecting source files.
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Glob patterns to exclude from analysis.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Abort the batch when a file cannot be tokenized.
    #[serde(default)]
    pub fail_on_tokenize_error: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            include: default_include(),
            exclude: default_exclude(),
            respect_gitignore: true,
            fail_on_tokenize_error: false,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_include() -> Vec<String> {
    vec!["**/*.cs".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec!["**/bin/**".to_string(), "**/obj/**".to_string()]
}

fn default_true() -> bool {
    true
}

/// Where to find rule graph definitions beyond the built-in set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphsConfig {
    /// Directory of `*.toml` graph definitions.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read config file.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse config.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Error message.
        message: String,
    },
}
