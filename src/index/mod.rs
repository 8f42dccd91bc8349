//! @acp:module "Index"
//! @acp:summary "Unit resolution, directory walk and cross-file aggregation"
//! @acp:domain cli
//! @acp:layer service

pub mod aggregate;
pub mod indexer;
pub mod unit;

pub use aggregate::{
    Aggregator, Count, EntityState, ExportAggregator, MergedState, Snapshot, StateAggregator,
    Summary, UnitExports,
};
pub use indexer::{scan_file, FileError, IndexReport, Indexer};
pub use unit::{ManifestResolver, Unit, UnitResolver};
