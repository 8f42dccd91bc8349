//! @acp:module "Generate Command"
//! @acp:summary "Index resources and write declaration files"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Implements `fxstubs generate`.

use std::path::PathBuf;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{BlankLinePolicy, Config};
use crate::index::{Count, IndexReport, Indexer};
use crate::render::{write_files, Renderer};

/// Snapshot file name written in JSON mode
pub const SNAPSHOT_FILE: &str = "snapshot.json";

/// Options for the generate command
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Root directory holding resources
    pub root: PathBuf,
    /// Output directory (config value when absent)
    pub output: Option<PathBuf>,
    /// Write the merged snapshot as JSON instead of Lua declarations
    pub json: bool,
    /// Let comment blocks continue across blank lines
    pub lenient_comments: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            output: None,
            json: false,
            lenient_comments: false,
        }
    }
}

/// Execute the generate command
pub fn execute_generate(options: GenerateOptions, mut config: Config) -> Result<()> {
    if options.lenient_comments {
        config.scan.blank_lines = BlankLinePolicy::Skip;
    }
    let output = options.output.clone().unwrap_or_else(|| config.output.clone());

    println!(
        "{} Scanning {}...",
        style("→").cyan(),
        options.root.display()
    );

    let indexer = Indexer::new(config.clone())?;
    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );
    let report = indexer.index_with_progress(&options.root, &progress)?;
    progress.finish_and_clear();

    if report.files_scanned == 0 && report.errors.is_empty() {
        eprintln!(
            "{} No Lua files inside a resource were found",
            style("✗").red()
        );
        eprintln!("  Resources are directories holding one of:");
        for manifest in &config.manifests {
            eprintln!("    {}", manifest);
        }
        std::process::exit(1);
    }

    for error in &report.errors {
        eprintln!(
            "{} Skipped {}: {}",
            style("⚠").yellow(),
            error.path.display(),
            error.message
        );
    }

    std::fs::create_dir_all(&output)?;
    if options.json {
        let path = output.join(SNAPSHOT_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(&report.snapshot)?)?;
        println!("{} Snapshot written to {}", style("✓").green(), path.display());
    } else {
        let renderer = Renderer::new(&config.render)?;
        let files = renderer.render_all(&report.snapshot)?;
        write_files(&output, &files)?;
        println!(
            "{} {} declaration files written to {}",
            style("✓").green(),
            files.len(),
            output.display()
        );
    }

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &IndexReport) {
    let summary = &report.snapshot.summary;
    println!("  Files: {} scanned, {} outside resources", report.files_scanned, report.files_skipped);
    println!("  Resources: {}", report.snapshot.exports.len());
    println!("  Exports: {}", format_count(summary.exports));
    println!("  GlobalState keys: {}", format_count(summary.global_states));
    println!("  Player state keys: {}", format_count(summary.entity_states));
}

fn format_count(count: Count) -> String {
    format!("{} unique ({} observed)", count.unique, count.observed)
}
