//! Post-processing pipelines
//!
//! Two fixed command sequences normalize the tree after generation:
//!
//! - hermetic: `gts fix`, `compileProtos src`. Tools must already be on
//!   PATH, nothing is installed, and any failure stops the pipeline.
//! - npm: `npm install`, `npm run fix`, `npx compileProtos src`. Every step
//!   runs once, in order, whatever the previous step's exit code.

use anyhow::Result;
use regen_core::config::{PostprocessConfig, StepConfig};
use regen_core::{CommandRunner, CommandSpec};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

use crate::error::RegenError;

/// Which post-processing pipeline to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Hermetic,
    Npm,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Hermetic => "hermetic",
            Mode::Npm => "npm",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "hermetic" => Ok(Mode::Hermetic),
            "npm" => Ok(Mode::Npm),
            other => anyhow::bail!("Unknown post-processing mode: {}", other),
        }
    }
}

/// A post-processing pipeline
#[derive(Debug, Clone, Serialize)]
pub struct Pipeline {
    pub description: String,
    pub steps: Vec<PipelineStep>,
}

/// A single external command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStep {
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    /// Abort on a missing tool or non-zero exit
    pub check: bool,
}

impl PipelineStep {
    fn new(name: &str, program: &str, args: &[&str], check: bool) -> Self {
        Self {
            name: name.to_string(),
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            check,
        }
    }

    pub fn command(&self, cwd: &Path) -> CommandSpec {
        CommandSpec::new(&self.program, self.args.iter().cloned(), cwd)
    }
}

impl From<&StepConfig> for PipelineStep {
    fn from(step: &StepConfig) -> Self {
        Self {
            name: step.name.clone(),
            program: step.program.clone(),
            args: step.args.clone(),
            check: step.check,
        }
    }
}

/// Result of running one step
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub name: String,
    pub command: String,
    pub success: bool,
    pub code: Option<i32>,
    pub duration_ms: u64,
}

/// Self-contained normalization using tools already on PATH
pub fn hermetic_pipeline() -> Pipeline {
    Pipeline {
        description: "Hermetic post-processing".to_string(),
        steps: vec![
            PipelineStep::new("fix", "gts", &["fix"], true),
            PipelineStep::new("compile", "compileProtos", &["src"], true),
        ],
    }
}

/// Install dependencies, fix, compile protos; exit codes ignored
pub fn npm_pipeline() -> Pipeline {
    Pipeline {
        description: "npm post-processing".to_string(),
        steps: vec![
            PipelineStep::new("install", "npm", &["install"], false),
            PipelineStep::new("fix", "npm", &["run", "fix"], false),
            PipelineStep::new("compile", "npx", &["compileProtos", "src"], false),
        ],
    }
}

/// Load the pipeline for a mode, honouring config overrides
pub fn load_pipeline(mode: Mode, config: &PostprocessConfig) -> Pipeline {
    let (mut pipeline, overrides) = match mode {
        Mode::Hermetic => (hermetic_pipeline(), config.hermetic.as_ref()),
        Mode::Npm => (npm_pipeline(), config.npm.as_ref()),
    };

    if let Some(steps) = overrides {
        pipeline.steps = steps.iter().map(PipelineStep::from).collect();
    }

    pipeline
}

/// Run every step in order.
///
/// Checked steps fail the pipeline when the tool is missing or exits
/// non-zero. Unchecked steps only log a warning. A command that cannot be
/// started at all is always fatal.
pub fn run_pipeline(
    pipeline: &Pipeline,
    runner: &dyn CommandRunner,
    cwd: &Path,
) -> Result<Vec<StepResult>> {
    tracing::info!(pipeline = %pipeline.description, "post-processing");

    let mut results = Vec::with_capacity(pipeline.steps.len());

    for step in &pipeline.steps {
        if step.check && runner.locate(&step.program).is_none() {
            return Err(RegenError::ToolNotFound(step.program.clone()).into());
        }

        let command = step.command(cwd);
        tracing::info!(step = %step.name, command = %command, "running step");

        let start = Instant::now();
        let outcome = runner.run(&command)?;
        let duration_ms = start.elapsed().as_millis() as u64;

        if !outcome.success {
            if step.check {
                return Err(RegenError::StepFailed {
                    step: step.name.clone(),
                    command: command.to_string(),
                    status: outcome.describe(),
                }
                .into());
            }
            tracing::warn!(
                step = %step.name,
                status = %outcome.describe(),
                "step failed, continuing"
            );
        }

        results.push(StepResult {
            name: step.name.clone(),
            command: command.to_string(),
            success: outcome.success,
            code: outcome.code,
            duration_ms,
        });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;

    #[test]
    fn test_npm_runs_each_step_once_in_order() {
        let runner = RecordingRunner::new();
        let results = run_pipeline(&npm_pipeline(), &runner, Path::new("/repo")).unwrap();

        assert_eq!(
            runner.commands(),
            vec!["npm install", "npm run fix", "npx compileProtos src"]
        );
        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["install", "fix", "compile"]);
        assert!(runner.calls.borrow().iter().all(|c| c.cwd == Path::new("/repo")));
    }

    #[test]
    fn test_npm_ignores_exit_codes() {
        let runner = RecordingRunner::new().failing("npm", 1).without("npx");
        let results = run_pipeline(&npm_pipeline(), &runner, Path::new(".")).unwrap();

        assert_eq!(runner.calls.borrow().len(), 3);
        assert!(!results[0].success);
        assert!(!results[1].success);
        assert!(results[2].success);
    }

    #[test]
    fn test_hermetic_steps() {
        let runner = RecordingRunner::new();
        run_pipeline(&hermetic_pipeline(), &runner, Path::new(".")).unwrap();
        assert_eq!(runner.commands(), vec!["gts fix", "compileProtos src"]);
    }

    #[test]
    fn test_hermetic_stops_on_failure() {
        let runner = RecordingRunner::new().failing("gts", 2);
        let err = run_pipeline(&hermetic_pipeline(), &runner, Path::new(".")).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<RegenError>(),
            Some(RegenError::StepFailed { step, .. }) if step == "fix"
        ));
        assert_eq!(runner.commands(), vec!["gts fix"]);
    }

    #[test]
    fn test_hermetic_missing_tool() {
        let runner = RecordingRunner::new().without("compileProtos");
        let err = run_pipeline(&hermetic_pipeline(), &runner, Path::new(".")).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<RegenError>(),
            Some(RegenError::ToolNotFound(tool)) if tool == "compileProtos"
        ));
        assert_eq!(runner.commands(), vec!["gts fix"]);
    }

    #[test]
    fn test_config_override() {
        let config = PostprocessConfig {
            npm: Some(vec![StepConfig {
                name: "install".to_string(),
                program: "yarn".to_string(),
                args: vec![],
                check: true,
            }]),
            ..Default::default()
        };

        let npm = load_pipeline(Mode::Npm, &config);
        assert_eq!(npm.steps, vec![PipelineStep::new("install", "yarn", &[], true)]);

        let hermetic = load_pipeline(Mode::Hermetic, &config);
        assert_eq!(hermetic.steps, hermetic_pipeline().steps);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("npm".parse::<Mode>().unwrap(), Mode::Npm);
        assert_eq!("Hermetic".parse::<Mode>().unwrap(), Mode::Hermetic);
        assert!("yarn".parse::<Mode>().is_err());
    }
}
