//! Template variable handling
//!
//! Provides variable substitution using {{PLACEHOLDER}} syntax.
//! Variables are replaced in file content, file/directory names and
//! generator command lines.

use chrono::Local;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::metadata::RepoMetadata;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([A-Z_][A-Z0-9_]*)\}\}").expect("valid placeholder regex"))
}

/// Template variables container
#[derive(Debug, Clone, Default)]
pub struct Variables {
    /// Variable name -> value mapping
    vars: HashMap<String, String>,
}

impl Variables {
    /// Create a container with the standard DATE and YEAR variables
    pub fn new() -> Self {
        let mut vars = Self::empty();
        let now = Local::now();
        vars.set("DATE", &now.format("%Y-%m-%d").to_string());
        vars.set("YEAR", &now.format("%Y").to_string());
        vars
    }

    /// Create a container with no variables
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set a variable value
    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_uppercase(), value.to_string());
    }

    /// Builder-style [`Variables::set`]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    /// Get a variable value
    pub fn get(&self, key: &str) -> Option<&String> {
        self.vars.get(&key.to_uppercase())
    }

    /// Add every present metadata field
    pub fn add_metadata(&mut self, metadata: &RepoMetadata) {
        for (key, value) in metadata.template_variables() {
            self.set(key, value);
        }
    }

    /// Replace all {{PLACEHOLDER}} patterns in a string
    pub fn substitute(&self, content: &str) -> String {
        placeholder_re()
            .replace_all(content, |caps: &regex::Captures| {
                let key = &caps[1];
                self.vars
                    .get(key)
                    .cloned()
                    .unwrap_or_else(|| format!("{{{{{}}}}}", key))
            })
            .to_string()
    }

    /// Find all variables used in a string
    pub fn find_used_variables(content: &str) -> Vec<String> {
        let mut vars: Vec<String> = placeholder_re()
            .captures_iter(content)
            .map(|cap| cap[1].to_string())
            .collect();

        vars.sort();
        vars.dedup();
        vars
    }
}

/// Check if a file is likely binary (should not have variable substitution)
pub fn is_binary_file(content: &[u8]) -> bool {
    // Check for null bytes in first 8KB
    let check_len = content.len().min(8192);
    content[..check_len].contains(&0)
}
