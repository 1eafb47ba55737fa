//! regen-core - Shared functionality for the regen tool
//!
//! Standard paths, the `.regen.yaml` configuration file and the process
//! boundary every external tool invocation goes through.

pub mod config;
pub mod paths;
pub mod process;

pub use config::Config;
pub use paths::Paths;
pub use process::{CommandOutcome, CommandRunner, CommandSpec, SystemRunner};
