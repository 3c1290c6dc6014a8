//! CLI: sources/model → (generate | model)
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::config::{GeneratorConfig, DEFAULT_EXTENSION, DEFAULT_OUTPUT_DIR};
use crate::generator::{Generator, Level};
use crate::model::{load, DeclarationModel};
use crate::partner::{NamingConvention, PartnerNameSource, DEFAULT_NAMING_PATTERN};
use crate::templates::Templates;
use crate::variant::MultiTagPolicy;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate abstract companion classes for @event/@request/@response tagged declarations
#[derive(Parser, Debug)]
#[command(name = "eventgen", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,

    /// more log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// render one companion class per tagged declaration
    Generate(GenerateOut),
    /// print the declaration model as JSON
    Model(ModelOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// Java sources: directories, literal files or quoted glob patterns
    #[arg(long, short, num_args = 1..)]
    source: Vec<String>,

    /// JSON declaration model files
    #[arg(long, short, num_args = 1..)]
    model: Vec<PathBuf>,

    /// treat model files as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// root of the generated source tree
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    out: PathBuf,

    /// extension of generated files
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    extension: String,

    /// directory with event.hbs / request.hbs / response.hbs overrides
    #[arg(long)]
    templates: Option<PathBuf>,

    /// regex whose `stem` group (or first group) is the partner name stem
    #[arg(long, default_value = DEFAULT_NAMING_PATTERN)]
    naming_pattern: String,

    /// name the naming pattern is applied to
    #[arg(long, value_enum, default_value_t = PartnerNameSource::Subclass)]
    partner_from: PartnerNameSource,

    /// skip declarations tagged for more than one variant instead of taking the first
    #[arg(long)]
    reject_multi_tag: bool,

    /// render and report without writing files
    #[arg(long)]
    dry_run: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct ModelOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_model(&self) -> anyhow::Result<DeclarationModel> {
        if self.source.is_empty() && self.model.is_empty() {
            anyhow::bail!("no input: pass --source and/or --model");
        }
        load::build_model(&self.source, &self.model, self.ndjson)
            .context("failed to build the declaration model")
    }
}

impl GenerateOut {
    fn config(&self) -> anyhow::Result<GeneratorConfig> {
        let naming = NamingConvention::new(&self.naming_pattern, self.partner_from)?;
        let policy = if self.reject_multi_tag {
            MultiTagPolicy::Reject
        } else {
            MultiTagPolicy::FirstWins
        };
        Ok(GeneratorConfig::new(&self.out)
            .with_extension(&self.extension)
            .with_naming(naming)
            .with_multi_tag_policy(policy)
            .with_dry_run(self.dry_run))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    /// Default log level from `-v`.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                // 1) setup: settings and templates fail before any file is touched
                let config = target.config()?;
                let templates = Templates::with_overrides(target.templates.as_deref())
                    .context("failed to load templates")?;

                // 2) build the model
                let model = target.input_settings.load_model()?;

                // 3) generate
                let report = Generator::new(&model, templates, config)
                    .run()
                    .context("generation aborted")?;

                // 4) summary
                for diagnostic in &report.diagnostics {
                    let line = diagnostic.to_string();
                    match diagnostic.level {
                        Level::Warning => eprintln!("{}", line.yellow()),
                        Level::Error => eprintln!("{}", line.red()),
                    }
                }
                let verb = if report.dry_run { "would generate" } else { "generated" };
                for file in &report.generated {
                    println!("{} {} ({} {})", verb.green(), file.path.display(), file.variant, file.declaration);
                }
                println!(
                    "{} {} file(s), {} skipped, {} warning(s)",
                    "done:".bold(),
                    report.generated.len(),
                    report.skipped().count(),
                    report.warnings().count(),
                );
                println!("{} {}", "source root:".bold(), report.source_root.display());
                Ok(())
            }
            Command::Model(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let model = target.input_settings.load_model()?;
                let json = serde_json::to_string_pretty(model.declarations())?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("failed to create {}", parent.display()))?;
                    }
                    std::fs::write(out, &json)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    println!("{json}");
                }
                Ok(())
            }
        }
    }
}
