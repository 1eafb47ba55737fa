//! Fatal conditions raised by regen

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegenError {
    #[error("Metadata file not found: {0}")]
    MissingMetadata(PathBuf),

    #[error("Malformed metadata in {path}: {reason}")]
    MalformedMetadata { path: PathBuf, reason: String },

    #[error("Invalid version identifier {0:?}")]
    InvalidVersion(String),

    #[error("Invalid exclusion pattern {pattern:?}: {reason}")]
    InvalidExclusion { pattern: String, reason: String },

    #[error("Template not found: {0}")]
    TemplateNotFound(PathBuf),

    #[error("Template path {path} renders to {rendered:?}, which is not a single file name")]
    InvalidTemplatePath { path: PathBuf, rendered: String },

    #[error("Tool not found on PATH: {0}")]
    ToolNotFound(String),

    #[error("Step '{step}' failed: `{command}` exited with {status}")]
    StepFailed {
        step: String,
        command: String,
        status: String,
    },

    #[error("No generator command configured (set generator.command in .regen.yaml)")]
    GeneratorNotConfigured,
}
