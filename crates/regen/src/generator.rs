//! Generator driver
//!
//! Runs the external client generator once per version into a temporary
//! directory and copies its output into the working tree. What the
//! generator does is its own business; regen only fills in the command line.

use anyhow::{Context, Result};
use regen_core::config::GeneratorConfig;
use regen_core::{CommandRunner, CommandSpec};
use std::path::Path;
use tempfile::TempDir;

use crate::copy::{copy_tree, CopyReport};
use crate::error::RegenError;
use crate::exclude::ExclusionSet;
use crate::variables::Variables;
use crate::version::{parse_versions, Version};

/// Validated generator settings
#[derive(Debug, Clone)]
pub struct GeneratorSpec {
    /// API name, e.g. `translate`
    pub name: String,
    pub versions: Vec<Version>,
    pub extra_protos: Vec<String>,
    /// Command line template, first element is the program
    pub command: Vec<String>,
}

impl GeneratorSpec {
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        Ok(Self {
            name: config.name.clone(),
            versions: parse_versions(&config.versions)?,
            extra_protos: config.extra_protos.clone(),
            command: config.command.clone(),
        })
    }

    /// Proto directory for a version, `google/cloud/{name}/{version}`
    pub fn proto_path(&self, version: &Version) -> String {
        format!("google/cloud/{}/{}", self.name, version)
    }

    /// Variables available to the command line
    pub fn variables(&self, version: &Version, output: &Path) -> Variables {
        let proto_path = self.proto_path(version);
        Variables::empty()
            .with("NAME", &self.name)
            .with("VERSION", version.as_str())
            .with(
                "GRPC_SERVICE_CONFIG",
                &format!("{}/{}_grpc_service_config.json", proto_path, self.name),
            )
            .with("PACKAGE_NAME", &format!("@google-cloud/{}", self.name))
            .with("EXTRA_PROTOS", &self.extra_protos.join(","))
            .with("OUTPUT", &output.to_string_lossy())
            .with("PROTO_PATH", &proto_path)
    }

    /// The concrete generator invocation for one version
    pub fn command_for(&self, version: &Version, output: &Path, cwd: &Path) -> Result<CommandSpec> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or(RegenError::GeneratorNotConfigured)?;

        let vars = self.variables(version, output);
        Ok(CommandSpec::new(
            &vars.substitute(program),
            args.iter().map(|a| vars.substitute(a)),
            cwd,
        ))
    }
}

/// Generate one version into a fresh temporary directory
pub fn generate_library(
    spec: &GeneratorSpec,
    version: &Version,
    runner: &dyn CommandRunner,
    cwd: &Path,
) -> Result<TempDir> {
    let output = tempfile::Builder::new()
        .prefix(&format!("regen-{}-", version))
        .tempdir()
        .context("Failed to create generator output directory")?;

    let command = spec.command_for(version, output.path(), cwd)?;
    tracing::info!(%version, command = %command, "running generator");

    let outcome = runner.run(&command)?;
    if !outcome.success {
        return Err(RegenError::StepFailed {
            step: format!("generate {}", version),
            command: command.to_string(),
            status: outcome.describe(),
        }
        .into());
    }

    Ok(output)
}

/// Generate every version in order and copy each into `dest`
pub fn generate_versions(
    spec: &GeneratorSpec,
    versions: &[Version],
    runner: &dyn CommandRunner,
    dest: &Path,
    excludes: &ExclusionSet,
) -> Result<Vec<(Version, CopyReport)>> {
    if spec.command.is_empty() {
        return Err(RegenError::GeneratorNotConfigured.into());
    }

    let mut reports = Vec::with_capacity(versions.len());
    for version in versions {
        let library = generate_library(spec, version, runner, dest)?;
        let report = copy_tree(library.path(), dest, excludes)
            .with_context(|| format!("Failed to copy generated {}", version))?;
        tracing::info!(%version, files = report.copied.len(), "copied generated library");
        reports.push((version.clone(), report));
    }

    Ok(reports)
}
