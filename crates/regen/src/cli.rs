//! CLI command definitions and handlers

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use regen::flow::{self, Context};
use regen::postprocess::{load_pipeline, Mode};
use regen::staging;
use regen::version::parse_versions;
use regen_core::config::CONFIG_FILE;
use regen_core::{Config, Paths, SystemRunner};
use std::path::{Path, PathBuf};

/// regen - Client library regeneration
#[derive(Parser)]
#[command(name = "regen")]
#[command(version)]
#[command(about = "Regenerate a client library from generator output, common templates and post-processing")]
#[command(after_help = "\
FLOWS:
    regen owlbot      Import owl-bot-staging, apply templates, hermetic post-processing
    regen synth       Run the generator per version, apply templates, npm post-processing

EXAMPLES:
    regen owlbot                       Regenerate the current repository
    regen import                       Only import the staging directory
    regen status                       Show what an import would do
    regen templates --source-location build/src
    regen postprocess --mode npm       npm install, npm run fix, npx compileProtos src
    regen generate --version v3        Generate a single version
    regen init                         Create .regen.yaml

STAGING:
    Each subdirectory of the staging directory is one API version. The
    default_version from .repo-metadata.json is imported last so its files
    win. README.md, package.json and src/index.ts are never copied.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Repository to regenerate (default: current directory)
    #[arg(long, global = true)]
    pub path: Option<PathBuf>,

    /// Config file (default: <path>/.regen.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Warnings and errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import staging, apply templates, hermetic post-processing
    Owlbot,

    /// Run the generator, apply templates, npm post-processing
    Synth,

    /// Import the staging directory into the repository
    Import,

    /// Render the common library templates into the repository
    Templates {
        /// Override templates.source_location
        #[arg(long)]
        source_location: Option<String>,
    },

    /// Run a post-processing pipeline
    Postprocess {
        #[arg(long, value_enum, default_value_t = ModeArg::Hermetic)]
        mode: ModeArg,
    },

    /// Run the generator for each version
    Generate {
        /// Version to generate (can be repeated, default: generator.versions)
        #[arg(long = "version", value_name = "VERSION")]
        versions: Vec<String>,
    },

    /// Show staging, metadata and pipeline status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a .regen.yaml config file
    Init,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Hermetic,
    Npm,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Hermetic => Mode::Hermetic,
            ModeArg::Npm => Mode::Npm,
        }
    }
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    let root = match cli.path {
        Some(ref path) => path.clone(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| root.join(CONFIG_FILE));
    let config = Config::load_or_default(&config_path)?;

    let runner = SystemRunner;
    let ctx = Context::new(root, config, Paths::new(), &runner);

    match cli.command {
        Commands::Owlbot => {
            flow::run_owlbot(&ctx)?;
            println!("success: regenerated {}", ctx.root().display());
            Ok(())
        }
        Commands::Synth => {
            flow::run_synth(&ctx)?;
            println!("success: regenerated {}", ctx.root().display());
            Ok(())
        }
        Commands::Import => cmd_import(&ctx),
        Commands::Templates { source_location } => cmd_templates(&ctx, source_location.as_deref()),
        Commands::Postprocess { mode } => cmd_postprocess(&ctx, mode.into()),
        Commands::Generate { versions } => cmd_generate(&ctx, &versions),
        Commands::Status { json } => cmd_status(&ctx, json),
        Commands::Init => cmd_init(ctx.root()),
    }
}

fn cmd_import(ctx: &Context) -> Result<()> {
    match flow::import(ctx)? {
        Some(report) => {
            let order: Vec<_> = report.order.iter().map(|v| v.as_str()).collect();
            let copied: usize = report.copies.iter().map(|(_, r)| r.copied.len()).sum();
            println!(
                "success: imported {} version(s) [{}], {} file(s)",
                report.copies.len(),
                order.join(", "),
                copied
            );
        }
        None => println!("info: no staging directory at {}", ctx.staging_dir().display()),
    }
    Ok(())
}

fn cmd_templates(ctx: &Context, source_location: Option<&str>) -> Result<()> {
    let report = flow::apply(ctx, source_location)?;
    println!("success: applied templates, {} file(s)", report.copied.len());
    Ok(())
}

fn cmd_postprocess(ctx: &Context, mode: Mode) -> Result<()> {
    let results = flow::postprocess(ctx, mode)?;
    let failed = results.iter().filter(|r| !r.success).count();
    if failed == 0 {
        println!("success: {} post-processing finished", mode);
    } else {
        println!("warning: {} post-processing finished, {} step(s) failed", mode, failed);
    }
    Ok(())
}

fn cmd_generate(ctx: &Context, versions: &[String]) -> Result<()> {
    let versions = if versions.is_empty() {
        None
    } else {
        Some(parse_versions(versions)?)
    };

    let reports = flow::generate(ctx, versions.as_deref())?;
    for (version, report) in &reports {
        println!("  {:<12} {} file(s)", version, report.copied.len());
    }
    println!("success: generated {} version(s)", reports.len());
    Ok(())
}

fn cmd_status(ctx: &Context, json: bool) -> Result<()> {
    let staging_dir = ctx.staging_dir();
    let metadata_file = ctx.metadata_file();
    let plan = staging::plan(&staging_dir, &metadata_file)?;
    let exclusion_set = ctx.excludes()?;
    let excludes: Vec<&str> = exclusion_set.patterns().collect();
    let templates = ctx.templates();
    let template_dir = templates.template_dir(&ctx.config.templates.name);
    let hermetic = load_pipeline(Mode::Hermetic, &ctx.config.postprocess);
    let npm = load_pipeline(Mode::Npm, &ctx.config.postprocess);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "root": ctx.root(),
                "staging_dir": staging_dir,
                "staged": plan.is_some(),
                "import": plan,
                "excludes": excludes,
                "template_dir": template_dir,
                "template_found": template_dir.is_dir(),
                "postprocess": {
                    "hermetic": hermetic,
                    "npm": npm,
                },
            }))?
        );
        return Ok(());
    }

    println!("Regen Status");
    println!("----------------------------");
    println!("Repository: {}", ctx.root().display());
    match plan {
        Some(plan) => {
            let order: Vec<_> = plan.order.iter().map(|v| v.as_str()).collect();
            println!("Staging: {}", staging_dir.display());
            println!("Default version: {}", plan.default_version);
            println!("Import order: {}", order.join(" -> "));
        }
        None => println!("Staging: none ({})", display_relative(&staging_dir, ctx.root())),
    }
    println!("Excludes: {}", excludes.join(", "));
    println!(
        "Templates: {}{}",
        template_dir.display(),
        if template_dir.is_dir() { "" } else { " (missing)" }
    );

    println!();
    for pipeline in [&hermetic, &npm] {
        println!("{}:", pipeline.description);
        for step in &pipeline.steps {
            println!("  - {:<8} {} {}", step.name, step.program, step.args.join(" "));
        }
    }

    Ok(())
}

fn cmd_init(root: &Path) -> Result<()> {
    let config_file = root.join(CONFIG_FILE);
    if config_file.exists() {
        bail!("Config already exists: {}", config_file.display());
    }

    let defaults = Config::default();
    let content = format!(
        r#"# regen configuration

staging_dir: {staging}
metadata_file: {metadata}

# Never copied from generated output
excludes:
{excludes}
templates:
  # dir: path/to/templates
  name: {template}
  source_location: {source_location}

generator:
  name: {name}
  versions: [{versions}]
  extra_protos: [{extra_protos}]
  # command:
  #   - gapic-generator-typescript
  #   - --proto-path
  #   - "{{{{PROTO_PATH}}}}"
  #   - --output
  #   - "{{{{OUTPUT}}}}"

# Replace post-processing steps (optional)
# postprocess:
#   npm:
#     - name: install
#       program: npm
#       args: [ci]
"#,
        staging = defaults.staging_dir.display(),
        metadata = defaults.metadata_file.display(),
        excludes = defaults
            .excludes
            .iter()
            .map(|e| format!("  - {}\n", e))
            .collect::<String>(),
        template = defaults.templates.name,
        source_location = defaults.templates.source_location,
        name = defaults.generator.name,
        versions = defaults.generator.versions.join(", "),
        extra_protos = defaults.generator.extra_protos.join(", "),
    );

    std::fs::write(&config_file, content)
        .with_context(|| format!("Failed to write {}", config_file.display()))?;

    println!("Created {}", config_file.display());
    Ok(())
}

fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
