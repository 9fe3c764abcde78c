//! nbonto CLI: semantic typing of notebook parameters.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use nbonto::engine::{Engine, EngineConfig};
use nbonto::value::ParamValue;

#[derive(Parser)]
#[command(name = "nbonto", version, about = "Semantic typing of notebook parameters")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Turtle ontology to load instead of the configured or bundled one.
    #[arg(long, global = true)]
    ontology: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a semantic comment and print its ontology type and Turtle.
    Comment {
        /// Comment text, without the leading `#`.
        text: String,

        /// Treat the comment as a standalone line (notebook-level).
        #[arg(long)]
        standalone: bool,
    },

    /// Reconcile a value, type annotation and ontology type.
    Reconcile {
        /// Default value as JSON (e.g. `20`, `null`, `"isgri"`).
        #[arg(long)]
        value: String,

        /// Python type annotation (e.g. `float | None`).
        #[arg(long)]
        annotation: Option<String>,

        /// Ontology type URI or CURIE (e.g. `oda:Float`).
        #[arg(long)]
        owl_type: Option<String>,

        /// Turtle describing a synthesized ontology type.
        #[arg(long)]
        extra_ttl: Option<String>,
    },

    /// Resolve an ontology class.
    Lookup {
        /// Class URI or CURIE.
        uri: String,
    },

    /// Reconcile every parameter of a parameters cell and print the contracts as JSON.
    Inspect {
        /// File with the parameters cell source.
        file: PathBuf,
    },

    /// Interpret request arguments against a parameters cell.
    Interpret {
        /// File with the parameters cell source.
        file: PathBuf,

        /// Argument as `name=value`; may be repeated.
        #[arg(long = "arg", value_parser = parse_arg)]
        args: Vec<(String, String)>,
    },

    /// Show engine info and statistics.
    Info,

    /// Write the effective configuration as TOML.
    Config {
        /// Destination file; printed to stdout when absent.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn parse_arg(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got \"{raw}\"")),
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(ontology) = cli.ontology {
        config.ontology.source = Some(ontology);
    }

    match cli.command {
        Commands::Comment { text, standalone } => {
            let engine = Engine::new(config)?;
            let annotation = engine.parse_comment(&text, !standalone)?;
            if annotation.is_none() {
                println!("No ontology annotation.");
            } else {
                if let Some(owl_type) = &annotation.owl_type {
                    println!("owl_type: {owl_type}");
                }
                if let Some(extra_ttl) = &annotation.extra_ttl {
                    println!("\n{extra_ttl}");
                }
            }
        }

        Commands::Reconcile {
            value,
            annotation,
            owl_type,
            extra_ttl,
        } => {
            let engine = Engine::new(config)?;
            let json: serde_json::Value = serde_json::from_str(&value).into_diagnostic()?;
            let reconciled = engine.reconcile(
                &ParamValue::from_json(json),
                annotation.as_deref(),
                owl_type.as_deref(),
                extra_ttl.as_deref(),
            )?;
            println!(
                "{}{}",
                reconciled.py_type,
                if reconciled.optional { " | None" } else { "" }
            );
        }

        Commands::Lookup { uri } => {
            let engine = Engine::new(config)?;
            let info = engine.lookup(&uri)?;
            let json = serde_json::to_string_pretty(&info).into_diagnostic()?;
            println!("{json}");
        }

        Commands::Inspect { file } => {
            let engine = Engine::new(config)?;
            let source = std::fs::read_to_string(&file).into_diagnostic()?;
            let contract = engine.inspect_notebook(&source)?;
            let json = serde_json::to_string_pretty(&contract).into_diagnostic()?;
            println!("{json}");
        }

        Commands::Interpret { file, args } => {
            let engine = Engine::new(config)?;
            let source = std::fs::read_to_string(&file).into_diagnostic()?;
            let contract = engine.inspect_notebook(&source)?;
            let args: Vec<(String, ParamValue)> = args
                .into_iter()
                .map(|(name, value)| (name, ParamValue::Str(value)))
                .collect();
            let values = engine.interpret(&contract.parameters, &args)?;
            let object: serde_json::Map<String, serde_json::Value> = values
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect();
            let json = serde_json::to_string_pretty(&object).into_diagnostic()?;
            println!("{json}");
        }

        Commands::Info => {
            let engine = Engine::new(config)?;
            println!("{}", engine.info());
        }

        Commands::Config { output } => match output {
            Some(path) => {
                config.save(&path)?;
                println!("Wrote configuration to {}", path.display());
            }
            None => {
                let toml = toml::to_string_pretty(&config).into_diagnostic()?;
                print!("{toml}");
            }
        },
    }

    Ok(())
}
