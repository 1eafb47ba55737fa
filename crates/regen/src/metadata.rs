//! Repository metadata (`.repo-metadata.json`)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::RegenError;
use crate::version::Version;

/// Fields of the repository metadata record that regen reads.
/// Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_pretty: Option<String>,
    #[serde(default)]
    pub distribution_name: Option<String>,
    #[serde(default)]
    pub product_documentation: Option<String>,
    #[serde(default)]
    pub client_documentation: Option<String>,
    #[serde(default)]
    pub api_id: Option<String>,
    #[serde(default)]
    pub release_level: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub default_version: Option<String>,
}

impl RepoMetadata {
    /// Read and parse a metadata file
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RegenError::MissingMetadata(path.to_path_buf()).into());
            }
            Err(e) => {
                return Err(RegenError::MalformedMetadata {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
                .into());
            }
        };

        serde_json::from_str(&content).map_err(|e| {
            RegenError::MalformedMetadata {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// The default version, which must be present and valid
    pub fn default_version(&self, path: &Path) -> Result<Version> {
        let raw = self
            .default_version
            .as_deref()
            .ok_or_else(|| RegenError::MalformedMetadata {
                path: path.to_path_buf(),
                reason: "missing field `default_version`".to_string(),
            })?;

        Version::new(raw).map_err(|e| {
            RegenError::MalformedMetadata {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Present fields as `(UPPER_SNAKE_NAME, value)` template variables
    pub fn template_variables(&self) -> Vec<(&'static str, &str)> {
        [
            ("NAME", &self.name),
            ("NAME_PRETTY", &self.name_pretty),
            ("DISTRIBUTION_NAME", &self.distribution_name),
            ("PRODUCT_DOCUMENTATION", &self.product_documentation),
            ("CLIENT_DOCUMENTATION", &self.client_documentation),
            ("API_ID", &self.api_id),
            ("RELEASE_LEVEL", &self.release_level),
            ("LANGUAGE", &self.language),
            ("REPO", &self.repo),
            ("DEFAULT_VERSION", &self.default_version),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
        .collect()
    }
}

/// Load just the default version from a metadata file
pub fn load_default_version(path: &Path) -> Result<Version> {
    RepoMetadata::load(path)?.default_version(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_metadata(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(".repo-metadata.json");
        fs::write(&path, content).unwrap();
        path
    }

    fn regen_error(err: &anyhow::Error) -> &RegenError {
        err.downcast_ref::<RegenError>().expect("RegenError")
    }

    #[test]
    fn test_load_default_version() {
        let dir = TempDir::new().unwrap();
        let path = write_metadata(
            &dir,
            r#"{"name": "translate", "name_pretty": "Cloud Translation", "default_version": "v3", "requires_billing": true}"#,
        );

        assert_eq!(load_default_version(&path).unwrap().as_str(), "v3");
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_default_version(&dir.path().join(".repo-metadata.json")).unwrap_err();
        assert!(matches!(regen_error(&err), RegenError::MissingMetadata(_)));
    }

    #[test]
    fn test_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = write_metadata(&dir, "{\"default_version\": ");
        let err = load_default_version(&path).unwrap_err();
        assert!(matches!(regen_error(&err), RegenError::MalformedMetadata { .. }));
    }

    #[test]
    fn test_missing_default_version() {
        let dir = TempDir::new().unwrap();
        let path = write_metadata(&dir, r#"{"name": "translate"}"#);
        let err = load_default_version(&path).unwrap_err();
        assert!(matches!(regen_error(&err), RegenError::MalformedMetadata { .. }));
        assert!(err.to_string().contains("default_version"));
    }

    #[test]
    fn test_invalid_default_version() {
        let dir = TempDir::new().unwrap();
        let path = write_metadata(&dir, r#"{"default_version": "../v3"}"#);
        let err = load_default_version(&path).unwrap_err();
        assert!(matches!(regen_error(&err), RegenError::MalformedMetadata { .. }));
    }

    #[test]
    fn test_template_variables() {
        let metadata = RepoMetadata {
            name: Some("translate".to_string()),
            default_version: Some("v3".to_string()),
            ..Default::default()
        };
        assert_eq!(
            metadata.template_variables(),
            vec![("NAME", "translate"), ("DEFAULT_VERSION", "v3")]
        );
    }
}
