//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# sharplint configuration

[style]
# "tab" or "space"
indent_style = "tab"
# Columns per indentation level (also the width of a tab)
indent_size = 4
# Longest allowed line
hard_wrap_at = 120
insert_final_newline = true
trim_trailing_whitespace = true

[analyzer]
# Root directory to analyze (default: current directory)
# root = "./src"

include = ["**/*.cs"]

# Glob patterns to exclude from analysis
exclude = [
    "**/bin/**",
    "**/obj/**",
]

# Respect .gitignore files
respect_gitignore = true

# Stop at the first file that cannot be tokenized
fail_on_tokenize_error = false

[graphs]
# Directory of extra rule graphs; a graph named like a built-in replaces it
# dir = "sharplint-graphs"
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = Path::new("sharplint.toml");

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_CONFIG)?;

    println!("Created sharplint.toml");
    println!("\nNext steps:");
    println!("  1. Edit sharplint.toml to match your style");
    println!("  2. Run: sharplint check");

    Ok(())
}
