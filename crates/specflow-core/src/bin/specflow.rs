//! `specflow` command line: parse documents, print the stage plan and configuration

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use specflow_core::stages::default_graph;
use specflow_core::SpecflowConfig;
use specflow_parser::DocumentParser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("specflow")
        .version(specflow_core::VERSION)
        .about("Requirement extraction and analysis pipeline tools")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Path to a specflow TOML configuration"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("parse")
                .about("Extract requirements from a document")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Document to parse"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(Command::new("plan").about("Print the analysis stage order"))
        .subcommand(Command::new("config").about("Print the effective configuration"))
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SpecflowConfig> {
    match path {
        Some(path) => SpecflowConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(SpecflowConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let config = load_config(matches.get_one::<PathBuf>("config"))?;

    match matches.subcommand() {
        Some(("parse", args)) => {
            let file = args
                .get_one::<PathBuf>("file")
                .context("missing document path")?;
            let text = std::fs::read_to_string(file)
                .with_context(|| format!("reading {}", file.display()))?;
            let doc = DocumentParser::new().parse_detailed(&text)?;
            tracing::info!(rule = %doc.rule, count = doc.len(), "parsed {}", file.display());

            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                println!("Rule: {}", doc.rule);
                println!("Requirements: {}", doc.len());
                println!();
                for req in &doc.requirements {
                    match &req.section {
                        Some(section) => println!("{}  {}  [{}]", req.id, req.name, section),
                        None => println!("{}  {}", req.id, req.name),
                    }
                }
            }
        }
        Some(("plan", _)) => {
            let graph = default_graph()?;
            println!("Analysis stages (max {} concurrent):", config.max_concurrent_stages);
            for (step, layer) in graph.layers().iter().enumerate() {
                let names: Vec<String> = layer
                    .iter()
                    .map(|s| format!("{} ({})", s.label(), s.id()))
                    .collect();
                println!("  {}. {}", step + 1, names.join(", "));
            }
        }
        Some(("config", _)) => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        _ => {}
    }

    Ok(())
}
