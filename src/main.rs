//! # fileroute
//!
//! Routes one input document through a configured output resource and
//! prints every file it publishes.

#![deny(unsafe_code)]

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use fileroute_core::Model;
use fileroute_core::logging::init_subscriber;
use fileroute_output::{CloseOutcome, Content, OutputRouter, ResourceServices, Session};
use serde_json::Value;
use tracing::info;

/// Write input into a managed output resource.
#[derive(Parser, Debug)]
#[command(name = "fileroute", about = "Route content into managed output files")]
struct Cli {
    /// Settings file (defaults to `$FILEROUTE_CONFIG` or `./fileroute.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resource to write through.
    #[arg(long)]
    resource: String,

    /// Model entry as `key=value`; JSON values are parsed, anything else is a string.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Input file (reads stdin when omitted).
    #[arg(long)]
    input: Option<PathBuf>,
}

fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected KEY=VALUE, got '{raw}'");
    };
    if key.is_empty() {
        bail!("empty key in '{raw}'");
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn read_input(input: Option<&PathBuf>) -> Result<Vec<u8>> {
    match input {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("Failed to read input: {}", path.display())),
        None => {
            let mut buf = Vec::new();
            let _ = std::io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(fileroute_settings::settings_path);
    let (settings, configs) = fileroute_settings::load_resource_configs(&config_path)
        .with_context(|| format!("Failed to load settings: {}", config_path.display()))?;
    init_subscriber(&settings.log_level);

    let router = OutputRouter::from_configs(configs, ResourceServices::default())?;

    let model = cli
        .set
        .iter()
        .map(String::as_str)
        .map(parse_assignment)
        .collect::<Result<Model>>()?;
    let mut session = Session::new(model);
    info!(session = %session.id(), resource = %cli.resource, "routing input");

    let content = Content::Bytes(read_input(cli.input.as_ref())?);
    router.write(&mut session, &cli.resource, &content)?;

    let mut published = Vec::new();
    if let CloseOutcome::Published(path) = router.visit_end(&mut session, &cli.resource)? {
        published.push(path);
    }
    published.extend(router.end_session(&mut session)?);

    for path in &published {
        info!(path = %path.display(), "published");
        println!("{}", path.display());
    }
    for list in session.list_files() {
        info!(path = %list.display(), "list file");
    }
    Ok(())
}
