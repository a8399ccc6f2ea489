//! Guidelines corpus CLI
//!
//! Loads and validates the source corpus, exports check data, prints page
//! data and shows the effective configuration.

use std::fs;
use std::path::{Path, PathBuf};

use a11y_guidelines::info_links::{resolve_info_links, StaticLabels};
use a11y_guidelines::loader::SourceLayout;
use a11y_guidelines::version::VersionInfo;
use a11y_guidelines::{config, Check, Corpus, EntityKey, EntityKind, GuidelineError, Settings};
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "a11y-gl")]
#[command(about = "Load, validate and export the accessibility guidelines corpus")]
struct Cli {
    /// Repository root containing data/ and version.py
    #[arg(short, long, global = true, default_value = ".")]
    base_dir: PathBuf,

    /// Configuration profile
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// YAML validation mode: strict, warning or disabled
    #[arg(long, global = true)]
    validation: Option<String>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the corpus and report entity counts
    Validate,

    /// Write the exported check data as JSON
    ExportChecks {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Documentation labels (JSON) used to link internal references
        #[arg(short, long)]
        labels: Option<PathBuf>,

        /// Publication name in the export header
        #[arg(long, default_value = "freee Accessibility Guidelines")]
        publish: String,
    },

    /// Print the page data of one entity as JSON
    Page {
        /// Entity type: guideline, check, faq or axe_rule
        kind: EntityKind,

        /// Entity ID
        id: String,

        /// Output language
        #[arg(long, default_value = "ja")]
        lang: String,
    },

    /// Print the effective settings as TOML
    Config,

    /// Print the check-sheet version from version.py
    Version,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<GuidelineError>() {
            Some(error) => eprintln!("{}", error.diagnostic()),
            None => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}

fn settings(cli: &Cli) -> anyhow::Result<Settings> {
    let overrides = cli
        .validation
        .as_ref()
        .map(|mode| json!({ "validation": { "yaml_validation": mode } }));
    let settings = config::initialize(cli.profile.as_deref(), overrides.as_ref())?;
    Ok(Settings::clone(&settings))
}

fn load(cli: &Cli) -> anyhow::Result<Corpus> {
    let settings = settings(cli)?;
    Ok(Corpus::initialize(&cli.base_dir, settings)?)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Validate => {
            let corpus = load(&cli)?;
            println!("✅ Corpus loaded from {}", cli.base_dir.display());
            for kind in EntityKind::ALL {
                println!("  {:<12} {}", kind.as_str(), corpus.count(kind));
            }
            if let Some(axe) = corpus.axe_metadata() {
                println!("  axe-core     {}", axe.version);
            }
            let unresolved = corpus.unresolved_info_refs().len();
            if unresolved > 0 {
                println!("  ({unresolved} internal references have no link until labels are resolved)");
            }
            Ok(())
        }

        Commands::ExportChecks {
            output,
            labels,
            publish,
        } => {
            let mut corpus = load(&cli)?;
            if let Some(labels) = labels {
                let source = StaticLabels::from_json_file(labels)?;
                resolve_info_links(&mut corpus, &source)?;
            }
            let version = VersionInfo::load(&SourceLayout::new(&cli.base_dir).version_file())?;
            let export = json!({
                "publish": publish,
                "version": version.checksheet_version,
                "date": version.checksheet_date,
                "checks": Check::object_data_all(&corpus),
            });
            let rendered = serde_json::to_string_pretty(&export)?;
            write_output(output.as_deref(), &rendered)
        }

        Commands::Page { kind, id, lang } => {
            let corpus = load(&cli)?;
            let page = corpus.page_data(&EntityKey::new(*kind, id.as_str()), lang)?;
            println!("{}", serde_json::to_string_pretty(&page)?);
            Ok(())
        }

        Commands::Config => {
            print!("{}", settings(&cli)?.to_toml()?);
            Ok(())
        }

        Commands::Version => {
            let version = VersionInfo::load(&SourceLayout::new(&cli.base_dir).version_file())?;
            println!("{version}");
            Ok(())
        }
    }
}

fn write_output(output: Option<&Path>, contents: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("📦 Wrote {}", path.display());
        }
        None => println!("{contents}"),
    }
    Ok(())
}
