//! End-to-end regeneration flows
//!
//! `owlbot`: import staging, apply templates, hermetic post-processing.
//! `synth`: run the generator per version, apply templates, npm
//! post-processing.

use anyhow::Result;
use regen_core::{CommandRunner, Config, Paths};
use std::path::{Path, PathBuf};

use crate::copy::CopyReport;
use crate::error::RegenError;
use crate::exclude::ExclusionSet;
use crate::generator::{generate_versions, GeneratorSpec};
use crate::metadata::RepoMetadata;
use crate::postprocess::{load_pipeline, run_pipeline, Mode, StepResult};
use crate::staging::{import_staging, ImportReport};
use crate::templates::{apply_templates, CommonTemplates};
use crate::version::Version;

/// Everything a flow needs
pub struct Context<'a> {
    /// Working tree being regenerated
    pub root: PathBuf,
    pub config: Config,
    pub paths: Paths,
    pub runner: &'a dyn CommandRunner,
}

impl<'a> Context<'a> {
    pub fn new(root: PathBuf, config: Config, paths: Paths, runner: &'a dyn CommandRunner) -> Self {
        Self {
            root,
            config,
            paths,
            runner,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn staging_dir(&self) -> PathBuf {
        Config::resolve(&self.root, &self.config.staging_dir)
    }

    pub fn metadata_file(&self) -> PathBuf {
        Config::resolve(&self.root, &self.config.metadata_file)
    }

    /// Exclusions applied to generated output
    pub fn excludes(&self) -> Result<ExclusionSet> {
        ExclusionSet::new(&self.config.excludes)
    }

    pub fn templates(&self) -> CommonTemplates {
        let root = match &self.config.templates.dir {
            Some(dir) => Config::resolve(&self.root, dir),
            None => self.paths.templates.clone(),
        };
        CommonTemplates::new(root)
    }

    /// Metadata for template variables; absent or unreadable metadata is
    /// not an error here
    fn template_metadata(&self) -> Option<RepoMetadata> {
        match RepoMetadata::load(&self.metadata_file()) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                if let Some(RegenError::MissingMetadata(_)) = e.downcast_ref::<RegenError>() {
                    tracing::debug!(error = %e, "rendering templates without metadata");
                } else {
                    tracing::warn!(
                        error = %e,
                        "ignoring unreadable metadata, rendering templates without it"
                    );
                }
                None
            }
        }
    }
}

/// Import the staging directory, if any
pub fn import(ctx: &Context) -> Result<Option<ImportReport>> {
    let excludes = ctx.excludes()?;
    import_staging(&ctx.staging_dir(), &ctx.metadata_file(), ctx.root(), &excludes)
}

/// Render the common library scaffold into the working tree
pub fn apply(ctx: &Context, source_location: Option<&str>) -> Result<CopyReport> {
    let settings = &ctx.config.templates;
    let source_location = source_location.unwrap_or(&settings.source_location);
    let metadata = ctx.template_metadata();

    apply_templates(
        &ctx.templates(),
        &settings.name,
        source_location,
        metadata.as_ref(),
        ctx.root(),
    )
}

/// Run a post-processing pipeline in the working tree
pub fn postprocess(ctx: &Context, mode: Mode) -> Result<Vec<StepResult>> {
    let pipeline = load_pipeline(mode, &ctx.config.postprocess);
    run_pipeline(&pipeline, ctx.runner, ctx.root())
}

/// Run the generator for the given versions, or the configured ones
pub fn generate(ctx: &Context, versions: Option<&[Version]>) -> Result<Vec<(Version, CopyReport)>> {
    let spec = GeneratorSpec::from_config(&ctx.config.generator)?;
    let versions = versions.unwrap_or(&spec.versions);
    let excludes = ctx.excludes()?;
    generate_versions(&spec, versions, ctx.runner, ctx.root(), &excludes)
}

/// Staging import, templates, hermetic post-processing
pub fn run_owlbot(ctx: &Context) -> Result<()> {
    import(ctx)?;
    apply(ctx, None)?;
    postprocess(ctx, Mode::Hermetic)?;
    Ok(())
}

/// Generator, templates, npm post-processing
pub fn run_synth(ctx: &Context) -> Result<()> {
    generate(ctx, None)?;
    apply(ctx, None)?;
    postprocess(ctx, Mode::Npm)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{write_file, RecordingRunner};
    use regen_core::config::NODE_LIBRARY_TEMPLATE as NODE_LIBRARY;
    use std::fs;
    use tempfile::TempDir;

    struct Workspace {
        repo: TempDir,
        data: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let ws = Self {
                repo: TempDir::new().unwrap(),
                data: TempDir::new().unwrap(),
            };
            let template = ws.data.path().join("templates").join(NODE_LIBRARY);
            write_file(&template, "README.md", "# {{NAME_PRETTY}}\n");
            write_file(&template, ".eslintrc.json", "{\"extends\": \"./node_modules/gts\"}\n");
            write_file(&template, "tsconfig.json", "{\"outDir\": \"{{SOURCE_LOCATION}}\"}\n");
            write_file(
                ws.repo.path(),
                ".repo-metadata.json",
                r#"{"name": "translate", "name_pretty": "Cloud Translation", "default_version": "v3"}"#,
            );
            write_file(ws.repo.path(), "src/index.ts", "// hand written");
            ws
        }

        fn context<'a>(&self, config: Config, runner: &'a RecordingRunner) -> Context<'a> {
            Context::new(
                self.repo.path().to_path_buf(),
                config,
                Paths::with_data_dir(self.data.path().to_path_buf()),
                runner,
            )
        }

        fn stage(&self, version: &str) {
            let dir = self.repo.path().join("owl-bot-staging").join(version);
            write_file(&dir, "src/index.ts", "// generated");
            write_file(&dir, "package.json", "{}");
            write_file(&dir, &format!("src/{}/translation_service_client.ts", version), "// client");
        }
    }

    #[test]
    fn test_owlbot_flow() {
        let ws = Workspace::new();
        ws.stage("v3beta1");
        ws.stage("v3");
        let runner = RecordingRunner::new();
        let ctx = ws.context(Config::default(), &runner);

        run_owlbot(&ctx).unwrap();

        let repo = ws.repo.path();
        assert!(!repo.join("owl-bot-staging").exists());
        assert!(repo.join("src/v3/translation_service_client.ts").exists());
        assert!(repo.join("src/v3beta1/translation_service_client.ts").exists());
        assert_eq!(
            fs::read_to_string(repo.join("src/index.ts")).unwrap(),
            "// hand written"
        );
        assert!(!repo.join("package.json").exists());

        // Templates land with no exclusions
        assert_eq!(
            fs::read_to_string(repo.join("README.md")).unwrap(),
            "# Cloud Translation\n"
        );
        assert_eq!(
            fs::read_to_string(repo.join("tsconfig.json")).unwrap(),
            "{\"outDir\": \"build/src\"}\n"
        );

        assert_eq!(runner.commands(), vec!["gts fix", "compileProtos src"]);
    }

    #[test]
    fn test_owlbot_without_staging() {
        let ws = Workspace::new();
        let runner = RecordingRunner::new();
        let ctx = ws.context(Config::default(), &runner);

        run_owlbot(&ctx).unwrap();

        assert!(ws.repo.path().join("README.md").exists());
        assert_eq!(runner.commands().len(), 2);
    }

    #[test]
    fn test_owlbot_import_failure_stops_flow() {
        let ws = Workspace::new();
        ws.stage("v3");
        fs::remove_file(ws.repo.path().join(".repo-metadata.json")).unwrap();
        let runner = RecordingRunner::new();
        let ctx = ws.context(Config::default(), &runner);

        assert!(run_owlbot(&ctx).is_err());
        assert!(!ws.repo.path().join("README.md").exists());
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn test_synth_flow() {
        let ws = Workspace::new();
        let runner = RecordingRunner::new().producing("src/v3/translation_service_client.ts", "// client");
        let mut config = Config::default();
        config.generator.command = vec![
            "gapic".to_string(),
            "--output".to_string(),
            "{{OUTPUT}}".to_string(),
            "{{VERSION}}".to_string(),
        ];
        let ctx = ws.context(config, &runner);

        run_synth(&ctx).unwrap();

        let commands = runner.commands();
        assert_eq!(commands.len(), 5);
        assert!(commands[0].starts_with("gapic --output ") && commands[0].ends_with(" v3beta1"));
        assert!(commands[1].ends_with(" v3"));
        assert_eq!(
            &commands[2..],
            &["npm install", "npm run fix", "npx compileProtos src"]
        );
        assert!(ws.repo.path().join("README.md").exists());
        assert!(ws
            .repo
            .path()
            .join("src/v3/translation_service_client.ts")
            .exists());
    }

    #[test]
    fn test_synth_requires_generator_command() {
        let ws = Workspace::new();
        let runner = RecordingRunner::new();
        let ctx = ws.context(Config::default(), &runner);

        let err = run_synth(&ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RegenError>(),
            Some(RegenError::GeneratorNotConfigured)
        ));
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn test_templates_dir_override() {
        let ws = Workspace::new();
        let custom = ws.repo.path().join("tools/templates");
        write_file(&custom.join(NODE_LIBRARY), "CUSTOM.md", "{{NAME}}");
        let runner = RecordingRunner::new();
        let mut config = Config::default();
        config.templates.dir = Some(PathBuf::from("tools/templates"));
        let ctx = ws.context(config, &runner);

        apply(&ctx, Some("lib")).unwrap();

        assert_eq!(
            fs::read_to_string(ws.repo.path().join("CUSTOM.md")).unwrap(),
            "translate"
        );
    }

    #[test]
    fn test_templates_tolerate_malformed_metadata() {
        let ws = Workspace::new();
        write_file(ws.repo.path(), ".repo-metadata.json", "{\"name\": ");
        let runner = RecordingRunner::new();
        let ctx = ws.context(Config::default(), &runner);

        let report = apply(&ctx, None).unwrap();

        assert!(report.copied.contains(&PathBuf::from("README.md")));
        assert_eq!(
            fs::read_to_string(ws.repo.path().join("README.md")).unwrap(),
            "# {{NAME_PRETTY}}\n"
        );
    }
}
