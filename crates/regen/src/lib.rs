//! regen - Client library regeneration
//!
//! Sequences the external toolchain that rebuilds a generated client
//! library: import per-version generator output (default version last),
//! render the common library scaffold, then run the post-processing
//! commands. Generation itself, templates and formatting all live in
//! external tools; this crate only moves files between them.

pub mod copy;
pub mod error;
pub mod exclude;
pub mod flow;
pub mod generator;
pub mod metadata;
pub mod postprocess;
pub mod staging;
pub mod templates;
pub mod variables;
pub mod version;

pub use copy::{copy_tree, CopyReport};
pub use error::RegenError;
pub use exclude::ExclusionSet;
pub use flow::Context;
pub use metadata::RepoMetadata;
pub use postprocess::{Mode, Pipeline, PipelineStep};
pub use staging::{import_staging, ImportPlan, ImportReport};
pub use templates::CommonTemplates;
pub use variables::Variables;
pub use version::Version;

#[cfg(test)]
pub(crate) mod testing;
