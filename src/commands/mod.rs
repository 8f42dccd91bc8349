//! @acp:module "Commands"
//! @acp:summary "CLI command implementations"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Each command is in its own submodule.

pub mod generate;
pub mod init;
pub mod inspect;

pub use generate::{execute_generate, GenerateOptions};
pub use init::{execute_init, InitOptions};
pub use inspect::{execute_inspect, InspectOptions};
