//! Staging importer
//!
//! An upstream generation step leaves its output in a staging directory,
//! one subdirectory per API version. The importer copies each version into
//! the working tree, default version last so its files win, then deletes
//! the staging directory.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::copy::{copy_tree, CopyReport};
use crate::exclude::ExclusionSet;
use crate::metadata::load_default_version;
use crate::version::{order_versions, Version};

/// What an import would do
#[derive(Debug, Clone, Serialize)]
pub struct ImportPlan {
    pub default_version: Version,
    /// Versions found in the staging directory
    pub discovered: Vec<Version>,
    /// Processing order, default last
    pub order: Vec<Version>,
}

/// What an import did
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub default_version: Version,
    pub order: Vec<Version>,
    /// Generated source directories, in processing order
    pub tracked: Vec<PathBuf>,
    pub copies: Vec<(Version, CopyReport)>,
}

/// Immediate subdirectories of the staging directory, sorted by name.
///
/// Symlinks to directories count as versions. Entries whose names are not
/// valid version identifiers are skipped.
pub fn discover_versions(staging_dir: &Path) -> Result<Vec<Version>> {
    let mut versions = Vec::new();

    for entry in fs::read_dir(staging_dir)
        .with_context(|| format!("Failed to read staging directory: {}", staging_dir.display()))?
    {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(name) => {
                tracing::warn!(?name, "skipping non UTF-8 staging entry");
                continue;
            }
        };
        match Version::new(name) {
            Ok(version) => versions.push(version),
            Err(e) => tracing::warn!(error = %e, "skipping staging entry"),
        }
    }

    versions.sort();
    Ok(versions)
}

/// Work out the import without touching anything.
/// `None` when there is no staging directory.
pub fn plan(staging_dir: &Path, metadata_file: &Path) -> Result<Option<ImportPlan>> {
    if !staging_dir.is_dir() {
        return Ok(None);
    }

    let default_version = load_default_version(metadata_file)?;
    let discovered = discover_versions(staging_dir)?;
    let order = order_versions(discovered.clone(), &default_version);

    Ok(Some(ImportPlan {
        default_version,
        discovered,
        order,
    }))
}

/// Import the staging directory into `dest` and remove it.
///
/// Returns `None`, having done nothing, when the staging directory does not
/// exist. Missing or malformed metadata and any copy failure are fatal; a
/// failed copy leaves the remaining versions and the staging directory in
/// place.
pub fn import_staging(
    staging_dir: &Path,
    metadata_file: &Path,
    dest: &Path,
    excludes: &ExclusionSet,
) -> Result<Option<ImportReport>> {
    let Some(plan) = plan(staging_dir, metadata_file)? else {
        tracing::info!(staging = %staging_dir.display(), "no staging directory, skipping import");
        return Ok(None);
    };

    tracing::info!(
        default_version = %plan.default_version,
        order = ?plan.order.iter().map(Version::as_str).collect::<Vec<_>>(),
        "importing staged versions"
    );

    let mut tracked = Vec::with_capacity(plan.order.len());
    let mut copies = Vec::with_capacity(plan.order.len());

    for version in &plan.order {
        let library = staging_dir.join(version.as_str());
        if !library.is_dir() {
            tracing::warn!(%version, path = %library.display(), "version not staged, nothing to copy");
            continue;
        }

        tracked.push(library.clone());
        let report = copy_tree(&library, dest, excludes)
            .with_context(|| format!("Failed to import staged version {}", version))?;
        tracing::info!(
            %version,
            copied = report.copied.len(),
            skipped = report.skipped.len(),
            "imported"
        );
        copies.push((version.clone(), report));
    }

    fs::remove_dir_all(staging_dir).with_context(|| {
        format!("Failed to remove staging directory: {}", staging_dir.display())
    })?;

    Ok(Some(ImportReport {
        default_version: plan.default_version,
        order: plan.order,
        tracked,
        copies,
    }))
}
