#![forbid(unsafe_code)]

//! @acp:module "fxstubs Library"
//! @acp:summary "Extracts exports and state bag usage from Lua resources into LuaLS declarations"
//! @acp:domain cli
//! @acp:layer api
//! @acp:stability stable
//!
//! # fxstubs
//!
//! Scans a tree of Lua resources, extracts exported function signatures,
//! `GlobalState` keys and player state bag keys together with their
//! `---` documentation, merges what it finds across files and renders
//! LuaLS `---@meta` files.
//!
//! ## Features
//!
//! - **Heuristic scanning**: line-oriented regex matching, bounded search windows
//! - **Doc tags**: `@param`, `@return` and `@deprecated` merged with signatures
//! - **State merging**: order-independent type widening and replication resolution
//! - **Parallel**: files are scanned with rayon, merged on one thread
//!
//! ## Example
//!
//! ```rust,no_run
//! use fxstubs::{Config, Indexer, Renderer};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let indexer = Indexer::new(config.clone())?;
//!
//!     // Index resources
//!     let report = indexer.index("resources")?;
//!
//!     // Render declaration files
//!     let renderer = Renderer::new(&config.render)?;
//!     let files = renderer.render_all(&report.snapshot)?;
//!     fxstubs::render::write_files(&config.output, &files)?;
//!
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod index;
pub mod model;
pub mod parse;
pub mod render;

// Re-exports
pub use config::{BlankLinePolicy, Config, RenderConfig, ScanConfig};
pub use error::{FxError, Result};
pub use index::{
    Aggregator, EntityState, IndexReport, Indexer, ManifestResolver, MergedState, Snapshot,
    Summary, Unit, UnitResolver,
};
pub use model::{
    ExportRecord, Param, Replication, ReturnValue, Side, SourceLocation, StateRecord, StateScope,
    ValueType,
};
pub use parse::{extract_comment_block, infer_value_type, parse_doc_tags, DocTags, ScanResult, Scanner};
pub use render::Renderer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
