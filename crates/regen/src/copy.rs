//! Copy generated trees into the working tree
//!
//! Files are merged into the destination: existing files are overwritten,
//! files absent from the source are left alone.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::exclude::ExclusionSet;

/// What a single copy did, as paths relative to the source root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CopyReport {
    pub copied: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

impl CopyReport {
    pub fn is_empty(&self) -> bool {
        self.copied.is_empty()
    }
}

/// Copy every file under `src` into `dest`, skipping excluded paths.
///
/// An excluded directory is skipped along with everything under it. The
/// first failure aborts the copy.
pub fn copy_tree(src: &Path, dest: &Path, excludes: &ExclusionSet) -> Result<CopyReport> {
    if !src.is_dir() {
        bail!("Source is not a directory: {}", src.display());
    }

    let mut report = CopyReport::default();

    let walker = WalkDir::new(src)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if !entry.file_type().is_dir() {
                return true;
            }
            let excluded = entry
                .path()
                .strip_prefix(src)
                .map(|rel| excludes.is_excluded(rel))
                .unwrap_or(false);
            if excluded {
                tracing::debug!(path = %entry.path().display(), "excluded directory");
            }
            !excluded
        });

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk: {}", src.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }

        let src_path = entry.path();
        let rel_path = src_path.strip_prefix(src)?;

        if excludes.is_excluded(rel_path) {
            tracing::debug!(path = %rel_path.display(), "excluded");
            report.skipped.push(rel_path.to_path_buf());
            continue;
        }

        let dest_path = dest.join(rel_path);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        // fs::copy carries permission bits along
        fs::copy(src_path, &dest_path).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                src_path.display(),
                dest_path.display()
            )
        })?;

        tracing::debug!(path = %rel_path.display(), "copied");
        report.copied.push(rel_path.to_path_buf());
    }

    if report.is_empty() {
        tracing::warn!(
            src = %src.display(),
            "no files were copied, does the source contain files?"
        );
    }

    Ok(report)
}
