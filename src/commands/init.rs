//! @acp:module "Init Command"
//! @acp:summary "Write a default fxstubs config"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Implements `fxstubs init`.

use std::path::PathBuf;

use anyhow::Result;
use console::style;

use crate::config::{Config, CONFIG_FILE};

/// Options for the init command
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Config file to create
    pub path: PathBuf,
    /// Force overwrite existing config
    pub force: bool,
    /// Output directory to record in the config
    pub output: Option<PathBuf>,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from(CONFIG_FILE),
            force: false,
            output: None,
        }
    }
}

/// Execute the init command
pub fn execute_init(options: InitOptions) -> Result<()> {
    if options.path.exists() && !options.force {
        eprintln!(
            "{} Config file already exists. Use --force to overwrite.",
            style("✗").red()
        );
        std::process::exit(1);
    }

    let mut config = Config::default();
    if let Some(output) = options.output {
        config.output = output;
    }

    config.save(&options.path)?;
    println!(
        "{} Created {}",
        style("✓").green(),
        options.path.display()
    );
    println!("  Include: {}", config.include.join(", "));
    println!("  Output: {}", config.output.display());

    Ok(())
}
