//! Common library templates
//!
//! A template is a directory whose files (and file names) may contain
//! {{PLACEHOLDER}} variables. Rendering produces a standard scaffold in a
//! temporary directory, which is then copied into the working tree with no
//! exclusions.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::copy::{copy_tree, CopyReport};
use crate::error::RegenError;
use crate::exclude::ExclusionSet;
use crate::metadata::RepoMetadata;
use crate::variables::{is_binary_file, Variables};

/// Template descriptor, never rendered into the scaffold
const TEMPLATE_DESCRIPTOR: &str = "template.json";

/// A rendered scaffold, removed when dropped
#[derive(Debug)]
pub struct Scaffold {
    dir: TempDir,
    /// Placeholders left without a value
    pub unresolved: Vec<String>,
}

impl Scaffold {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// The common template root
#[derive(Debug, Clone)]
pub struct CommonTemplates {
    root: PathBuf,
}

impl CommonTemplates {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Directory of a named template
    pub fn template_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Scaffold from a named template with the standard library variables
    pub fn library(
        &self,
        name: &str,
        source_location: &str,
        metadata: Option<&RepoMetadata>,
    ) -> Result<Scaffold> {
        let mut vars = Variables::new();
        if let Some(metadata) = metadata {
            vars.add_metadata(metadata);
        }
        vars.set("SOURCE_LOCATION", source_location);

        self.render(name, &vars)
    }

    /// Render a template into a fresh temporary directory
    pub fn render(&self, name: &str, vars: &Variables) -> Result<Scaffold> {
        let template_dir = self.template_dir(name);
        if !template_dir.is_dir() {
            return Err(RegenError::TemplateNotFound(template_dir).into());
        }

        let dir = tempfile::Builder::new()
            .prefix("regen-templates-")
            .tempdir()
            .context("Failed to create scaffold directory")?;

        let mut unresolved = BTreeSet::new();

        for entry in WalkDir::new(&template_dir).min_depth(1) {
            let entry = entry.with_context(|| format!("Failed to walk: {}", template_dir.display()))?;
            let src_path = entry.path();
            let rel_path = src_path.strip_prefix(&template_dir)?;

            if rel_path.as_os_str() == TEMPLATE_DESCRIPTOR {
                continue;
            }

            // Substitute variables in path components; each must stay one
            // plain name so the scaffold cannot write outside its directory
            let mut dest_rel = PathBuf::new();
            for component in rel_path.components() {
                let component_str = component.as_os_str().to_string_lossy();
                let rendered = vars.substitute(&component_str);
                if !is_file_name(&rendered) {
                    return Err(RegenError::InvalidTemplatePath {
                        path: rel_path.to_path_buf(),
                        rendered,
                    }
                    .into());
                }
                dest_rel.push(rendered);
            }
            let dest_path = dir.path().join(&dest_rel);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&dest_path)
                    .with_context(|| format!("Failed to create directory: {}", dest_path.display()))?;
                continue;
            }

            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let content = fs::read(src_path)
                .with_context(|| format!("Failed to read: {}", src_path.display()))?;

            if is_binary_file(&content) {
                fs::write(&dest_path, &content)
                    .with_context(|| format!("Failed to write: {}", dest_path.display()))?;
            } else {
                match String::from_utf8(content) {
                    Ok(text) => {
                        let substituted = vars.substitute(&text);
                        unresolved.extend(Variables::find_used_variables(&substituted));
                        fs::write(&dest_path, substituted)
                            .with_context(|| format!("Failed to write: {}", dest_path.display()))?;
                    }
                    Err(e) => {
                        tracing::debug!(path = %rel_path.display(), "not UTF-8, copied verbatim");
                        fs::write(&dest_path, e.as_bytes())
                            .with_context(|| format!("Failed to write: {}", dest_path.display()))?;
                    }
                }
            }

            preserve_executable(src_path, &dest_path)?;
        }

        let unresolved: Vec<String> = unresolved.into_iter().collect();
        if !unresolved.is_empty() {
            tracing::warn!(template = name, ?unresolved, "placeholders without a value");
        }

        Ok(Scaffold { dir, unresolved })
    }
}

fn is_file_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(unix)]
fn preserve_executable(src: &Path, dest: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let src_mode = src.metadata()?.permissions().mode();
    if src_mode & 0o111 != 0 {
        let mut perms = fs::metadata(dest)?.permissions();
        perms.set_mode(src_mode);
        fs::set_permissions(dest, perms)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn preserve_executable(_src: &Path, _dest: &Path) -> Result<()> {
    Ok(())
}

/// Render a library scaffold and copy it into `dest`, excluding nothing
pub fn apply_templates(
    templates: &CommonTemplates,
    name: &str,
    source_location: &str,
    metadata: Option<&RepoMetadata>,
    dest: &Path,
) -> Result<CopyReport> {
    tracing::info!(template = name, source_location, "applying common templates");

    let scaffold = templates.library(name, source_location, metadata)?;
    copy_tree(scaffold.path(), dest, &ExclusionSet::empty())
        .with_context(|| format!("Failed to copy scaffold from template: {}", name))
}
