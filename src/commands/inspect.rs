//! @acp:module "Inspect Command"
//! @acp:summary "Scan a single file and print its raw records"
//! @acp:domain cli
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;

use crate::config::Config;
use crate::parse::Scanner;

/// Options for the inspect command
#[derive(Debug, Clone)]
pub struct InspectOptions {
    /// File to scan
    pub file: PathBuf,
}

/// Execute the inspect command
pub fn execute_inspect(options: InspectOptions, config: &Config) -> Result<()> {
    let content = std::fs::read_to_string(&options.file)
        .with_context(|| format!("Failed to read {}", options.file.display()))?;

    let scanner = Scanner::new(&config.scan);
    let result = scanner.scan(&content, &options.file.to_string_lossy());
    if result.is_empty() {
        eprintln!(
            "{} No exports or state writes found in {}",
            style("⚠").yellow(),
            options.file.display()
        );
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
