//! Workspace configuration (`.regen.yaml`)
//!
//! Every field has a default matching the conventional client library
//! layout, so a repository without a config file still works.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = ".regen.yaml";

/// Hand-maintained files that generated output must never overwrite
pub const GENERATED_OUTPUT_EXCLUDES: &[&str] = &["README.md", "package.json", "src/index.ts"];

/// Template rendered for a Node.js client library
pub const NODE_LIBRARY_TEMPLATE: &str = "node_library";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Staging directory produced by the upstream generation step
    pub staging_dir: PathBuf,
    /// Repository metadata file holding `default_version`
    pub metadata_file: PathBuf,
    /// Paths never copied from generated output
    pub excludes: Vec<String>,
    /// Common template settings
    pub templates: TemplatesConfig,
    /// Generator driver settings
    pub generator: GeneratorConfig,
    /// Post-processing step overrides
    pub postprocess: PostprocessConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("owl-bot-staging"),
            metadata_file: PathBuf::from(".repo-metadata.json"),
            excludes: GENERATED_OUTPUT_EXCLUDES
                .iter()
                .map(|e| e.to_string())
                .collect(),
            templates: TemplatesConfig::default(),
            generator: GeneratorConfig::default(),
            postprocess: PostprocessConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Template root override (falls back to `Paths::templates`)
    pub dir: Option<PathBuf>,
    /// Template to render
    pub name: String,
    /// Value of `{{SOURCE_LOCATION}}`
    pub source_location: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: None,
            name: NODE_LIBRARY_TEMPLATE.to_string(),
            source_location: "build/src".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// API name, e.g. `translate`
    pub name: String,
    /// Versions generated in order
    pub versions: Vec<String>,
    /// Extra proto files passed to the generator
    pub extra_protos: Vec<String>,
    /// Generator command line with `{{PLACEHOLDER}}` variables
    pub command: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            name: "translate".to_string(),
            versions: vec!["v3beta1".to_string(), "v3".to_string()],
            extra_protos: vec!["google/cloud/common_resources.proto".to_string()],
            command: Vec::new(),
        }
    }
}

/// Replacement step lists for the post-processing pipelines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostprocessConfig {
    pub hermetic: Option<Vec<StepConfig>>,
    pub npm: Option<Vec<StepConfig>>,
}

/// A single external command in a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Fail the pipeline on a missing tool or non-zero exit
    #[serde(default)]
    pub check: bool,
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Load config if the file exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading config");
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve a configured path against the working directory
    pub fn resolve(root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }
}
