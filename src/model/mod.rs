//! @acp:module "Model"
//! @acp:summary "Records produced by the scanner and consumed by the aggregator"
//! @acp:domain cli
//! @acp:layer model

mod types;

pub use types::*;
