//! Process boundary
//!
//! All external tools (generator, package manager, formatter, proto
//! compiler) are invoked through [`CommandRunner`], so callers can be driven
//! against a stub in tests.

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A fully resolved command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory for the child
    pub cwd: PathBuf,
}

impl CommandSpec {
    pub fn new<I, S>(program: &str, args: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.to_path_buf(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How a finished command exited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
}

impl CommandOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
        }
    }

    pub fn failed(code: i32) -> Self {
        Self {
            success: false,
            code: Some(code),
        }
    }

    /// Human-readable exit status
    pub fn describe(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "signal".to_string(),
        }
    }
}

/// Runs external commands to completion
pub trait CommandRunner {
    /// Run a command, blocking until it exits. Errors only when the
    /// command could not be started.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome>;

    /// Locate a program on PATH
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

/// Runs commands as real child processes with inherited stdio
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome> {
        tracing::debug!(command = %spec, cwd = %spec.cwd.display(), "spawning");

        let status = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .status()
            .with_context(|| format!("Failed to run: {}", spec))?;

        Ok(CommandOutcome {
            success: status.success(),
            code: status.code(),
        })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_display() {
        let spec = CommandSpec::new("npx", ["compileProtos", "src"], Path::new("."));
        assert_eq!(spec.to_string(), "npx compileProtos src");
    }

    #[test]
    fn test_describe() {
        assert_eq!(CommandOutcome::failed(2).describe(), "exit code 2");
        assert_eq!(CommandOutcome::ok().describe(), "exit code 0");
    }

    #[test]
    fn test_missing_program_is_error() {
        let dir = TempDir::new().unwrap();
        let spec = CommandSpec::new(
            "regen-definitely-not-a-real-program",
            Vec::<String>::new(),
            dir.path(),
        );
        assert!(SystemRunner.run(&spec).is_err());
        assert!(SystemRunner
            .locate("regen-definitely-not-a-real-program")
            .is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status() {
        let dir = TempDir::new().unwrap();
        let ok = SystemRunner
            .run(&CommandSpec::new("sh", ["-c", "exit 0"], dir.path()))
            .unwrap();
        assert!(ok.success);

        let failed = SystemRunner
            .run(&CommandSpec::new("sh", ["-c", "exit 3"], dir.path()))
            .unwrap();
        assert!(!failed.success);
        assert_eq!(failed.code, Some(3));
    }
}
