//! @acp:module "Indexer"
//! @acp:summary "Walks a tree of resources, scans Lua files and aggregates the records"
//! @acp:domain cli
//! @acp:layer service
//!
//! Reading and scanning run in parallel (scans are pure); aggregation runs
//! afterwards on a single thread in sorted file order so output is stable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glob::Pattern;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{FxError, Result};
use crate::parse::{ScanResult, Scanner};

use super::aggregate::{Aggregator, Snapshot};
use super::unit::{ManifestResolver, Unit, UnitResolver};

/// @acp:summary "A file that could not be read; the run continued without it"
#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    pub path: PathBuf,
    pub message: String,
}

/// @acp:summary "Outcome of one indexing run"
#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    pub snapshot: Snapshot,
    /// Files scanned and aggregated
    pub files_scanned: usize,
    /// Matched files that belong to no unit
    pub files_skipped: usize,
    pub errors: Vec<FileError>,
}

/// @acp:summary "Resource tree indexer with parallel file scanning"
pub struct Indexer {
    config: Config,
    scanner: Arc<Scanner>,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl Indexer {
    pub fn new(config: Config) -> Result<Self> {
        let include = compile_patterns(&config.include)?;
        let exclude = compile_patterns(&config.exclude)?;
        Ok(Self {
            scanner: Arc::new(Scanner::new(&config.scan)),
            config,
            include,
            exclude,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// @acp:summary "Index a tree using manifest-based unit resolution"
    pub fn index<P: AsRef<Path>>(&self, root: P) -> Result<IndexReport> {
        self.index_with_progress(root, &ProgressBar::hidden())
    }

    pub fn index_with_progress<P: AsRef<Path>>(
        &self,
        root: P,
        progress: &ProgressBar,
    ) -> Result<IndexReport> {
        let root = root.as_ref();
        let resolver = ManifestResolver::new(root, self.config.manifests.clone());
        self.index_with_resolver(root, &resolver, progress)
    }

    /// @acp:summary "Index a tree with an injected file-to-unit mapping"
    /// @acp:ai-careful "Scans run in parallel; aggregation must stay sequential"
    pub fn index_with_resolver<P: AsRef<Path>>(
        &self,
        root: P,
        resolver: &dyn UnitResolver,
        progress: &ProgressBar,
    ) -> Result<IndexReport> {
        let root = root.as_ref();
        let files = self.find_files(root)?;

        let mut owned: Vec<(PathBuf, Unit)> = Vec::with_capacity(files.len());
        let mut files_skipped = 0;
        for path in files {
            match resolver.resolve(&path) {
                Some(unit) => owned.push((path, unit)),
                None => {
                    tracing::debug!("{} belongs to no unit, skipping", path.display());
                    files_skipped += 1;
                }
            }
        }

        progress.set_length(owned.len() as u64);

        let scanner = Arc::clone(&self.scanner);
        let results: Vec<_> = owned
            .par_iter()
            .map(|(path, unit)| {
                let result = scan_file(&scanner, path, unit);
                progress.inc(1);
                result
            })
            .collect();

        let mut aggregator = Aggregator::new();
        let mut errors = Vec::new();
        let mut files_scanned = 0;

        for ((path, unit), result) in owned.iter().zip(results) {
            match result {
                Ok(scan) => {
                    tracing::debug!(
                        "{} [{}]: {} exports, {} global, {} entity",
                        path.display(),
                        unit.name,
                        scan.exports.len(),
                        scan.global_states.len(),
                        scan.entity_states.len()
                    );
                    aggregator.add_scan(&unit.name, scan);
                    files_scanned += 1;
                }
                Err(err) => {
                    tracing::warn!("{}", err);
                    errors.push(FileError {
                        path: path.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        Ok(IndexReport {
            snapshot: aggregator.snapshot(),
            files_scanned,
            files_skipped,
            errors,
        })
    }

    /// @acp:summary "Find all files matching include/exclude patterns"
    pub fn find_files<P: AsRef<Path>>(&self, root: P) -> Result<Vec<PathBuf>> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(FxError::Other(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let match_opts = glob::MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };

        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                // Patterns are matched against the root-relative path
                let relative_path = e
                    .path()
                    .strip_prefix(root)
                    .unwrap_or(e.path())
                    .to_string_lossy()
                    .replace('\\', "/");

                let included = self.include.is_empty()
                    || self.include.iter().any(|p| p.matches_with(&relative_path, match_opts));
                let excluded = self.exclude.iter().any(|p| p.matches_with(&relative_path, match_opts));

                included && !excluded
            })
            .map(|e| e.into_path())
            .collect();

        files.sort();
        Ok(files)
    }
}

/// @acp:summary "Read and scan one file on behalf of its unit"
///
/// The side is classified from the unit-relative path, so directory names
/// above the unit root never leak into it.
pub fn scan_file(scanner: &Scanner, path: &Path, unit: &Unit) -> Result<ScanResult> {
    let bytes = std::fs::read(path).map_err(|source| FxError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let content = String::from_utf8_lossy(&bytes);
    Ok(scanner.scan(&content, &unit.relative_path(path)))
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| FxError::Pattern {
                pattern: p.clone(),
                message: e.to_string(),
            })
        })
        .collect()
}
