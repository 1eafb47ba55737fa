//! Shared test fixtures

use anyhow::Result;
use regen_core::config::GENERATED_OUTPUT_EXCLUDES;
use regen_core::{CommandOutcome, CommandRunner, CommandSpec};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::exclude::ExclusionSet;

/// Write a file, creating parent directories
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// The default exclusions for generated output
pub fn generated_excludes() -> ExclusionSet {
    ExclusionSet::new(GENERATED_OUTPUT_EXCLUDES).unwrap()
}

/// Records every command instead of running it
#[derive(Default)]
pub struct RecordingRunner {
    pub calls: RefCell<Vec<CommandSpec>>,
    /// Exit codes by program name, 0 when absent
    pub exit_codes: HashMap<String, i32>,
    /// Programs that `locate` reports missing
    pub missing: Vec<String>,
    /// Files the stub creates under `{{OUTPUT}}`-style `--output` args
    pub outputs: Vec<(String, String)>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, program: &str, code: i32) -> Self {
        self.exit_codes.insert(program.to_string(), code);
        self
    }

    pub fn without(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    pub fn producing(mut self, rel: &str, content: &str) -> Self {
        self.outputs.push((rel.to_string(), content.to_string()));
        self
    }

    /// `program arg...` for each recorded call
    pub fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.to_string()).collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome> {
        self.calls.borrow_mut().push(spec.clone());

        // Emulate a generator writing into the directory after `--output`
        if let Some(pos) = spec.args.iter().position(|a| a == "--output") {
            if let Some(out) = spec.args.get(pos + 1) {
                let out = PathBuf::from(out);
                for (rel, content) in &self.outputs {
                    let content = content.replace("{{ARGS}}", &spec.args.join(" "));
                    write_file(&out, rel, &content);
                }
            }
        }

        match self.exit_codes.get(&spec.program) {
            Some(&code) if code != 0 => Ok(CommandOutcome::failed(code)),
            _ => Ok(CommandOutcome::ok()),
        }
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        if self.missing.iter().any(|m| m == program) {
            None
        } else {
            Some(PathBuf::from("/usr/bin").join(program))
        }
    }
}
