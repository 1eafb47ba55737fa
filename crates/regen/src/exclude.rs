//! Exclusion sets for copying generated output
//!
//! Patterns are relative to the root of the tree being copied and always
//! use `/` separators. `*` and `?` stay within one path segment, `**`
//! spans any number of segments. A pattern without wildcards matches only
//! that exact path.

use anyhow::Result;
use regex::Regex;
use std::path::{Component, Path};

use crate::error::RegenError;

#[derive(Debug, Clone)]
struct Pattern {
    raw: String,
    regex: Regex,
}

/// A validated set of relative path patterns
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<Pattern>,
}

impl ExclusionSet {
    /// An exclusion set that excludes nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate and compile a list of patterns
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(patterns.len());

        for raw in patterns {
            let raw = raw.as_ref();
            let normalized = validate(raw)?;
            let regex = Regex::new(&glob_to_regex(&normalized)).map_err(|e| {
                RegenError::InvalidExclusion {
                    pattern: raw.to_string(),
                    reason: e.to_string(),
                }
            })?;
            compiled.push(Pattern {
                raw: normalized,
                regex,
            });
        }

        Ok(Self { patterns: compiled })
    }

    /// The normalized patterns, in the order given
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.raw.as_str())
    }

    /// Whether a path relative to the copy root is excluded
    pub fn is_excluded(&self, rel_path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let rel = to_slash(rel_path);
        self.patterns.iter().any(|p| p.regex.is_match(&rel))
    }
}

fn validate(raw: &str) -> Result<String> {
    let invalid = |reason: &str| RegenError::InvalidExclusion {
        pattern: raw.to_string(),
        reason: reason.to_string(),
    };

    let normalized = raw.replace('\\', "/");
    let normalized = normalized.trim_start_matches("./");

    if normalized.is_empty() {
        return Err(invalid("pattern is empty").into());
    }
    if normalized.starts_with('/') || Path::new(raw).is_absolute() {
        return Err(invalid("pattern must be relative").into());
    }
    if normalized.split('/').any(|segment| segment == "..") {
        return Err(invalid("pattern may not leave the copy root").into());
    }

    Ok(normalized.trim_end_matches('/').to_string())
}

fn glob_to_regex(pattern: &str) -> String {
    let mut re = String::from("^");
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    re.push_str("(?:.*/)?");
                } else {
                    re.push_str(".*");
                }
            }
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            _ => re.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }

    re.push('$');
    re
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
