//! API version identifiers and processing order

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::RegenError;

/// A validated API version identifier such as `v3` or `v3beta1`.
///
/// Versions name directories, so they may not be empty, `.`/`..`, or
/// contain path separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() || raw == "." || raw == ".." || raw.contains(['/', '\\']) {
            return Err(RegenError::InvalidVersion(raw).into());
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Version {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate a list of raw version strings
pub fn parse_versions<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Version>> {
    raw.iter().map(|v| Version::new(v.as_ref())).collect()
}

/// Order versions so the default comes last.
///
/// Non-default versions keep their discovery order. The default is always
/// appended, even when it was not discovered, so its output is written last
/// and wins over the others.
pub fn order_versions(discovered: Vec<Version>, default: &Version) -> Vec<Version> {
    let mut ordered: Vec<Version> = discovered.into_iter().filter(|v| v != default).collect();
    ordered.push(default.clone());
    ordered
}
