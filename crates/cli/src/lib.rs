pub mod logging;
pub mod replay;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use serde::Serialize;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use viewer_core::{compute_window, PageNumber, SyncConfig, DEFAULT_WINDOW_RADIUS};

use crate::logging::{init_logging, LogFormat};
use crate::replay::{replay, Scenario};

#[derive(Debug, Parser)]
#[command(name = "viewer-sync")]
#[command(about = "Multi-document viewport synchronization tools")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    log_format: LogFormat,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a scenario file and print the resulting state as JSON.
    Replay {
        #[arg(value_name = "SCENARIO")]
        scenario: PathBuf,
        /// Engine configuration (JSON). Overrides the scenario's own config.
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Print the virtualization window around a page.
    Window {
        #[arg(long)]
        center: PageNumber,
        #[arg(long)]
        pages: u32,
        #[arg(long, default_value_t = DEFAULT_WINDOW_RADIUS)]
        radius: u32,
        /// Currently rendered pages, comma separated.
        #[arg(long, value_delimiter = ',')]
        prior: Option<Vec<PageNumber>>,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct WindowOutput {
    center: PageNumber,
    page_count: u32,
    radius: u32,
    rendered: BTreeSet<PageNumber>,
    visible: BTreeSet<PageNumber>,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_logging(cli.verbosity.tracing_level_filter(), cli.log_format);

    match cli.command {
        Commands::Replay { scenario, config } => run_replay(&scenario, config.as_deref()),
        Commands::Window { center, pages, radius, prior } => {
            run_window(center, pages, radius, prior)
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_replay(scenario_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let scenario = Scenario::from_file(scenario_path)?;

    let config = match (config_path, &scenario.config) {
        (Some(path), _) => SyncConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        (None, Some(config)) => {
            config.validate().context("invalid scenario config")?;
            config.clone()
        }
        (None, None) => SyncConfig::from_env().context("invalid environment config")?,
    };

    let report = replay(&scenario, config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn run_window(
    center: PageNumber,
    page_count: u32,
    radius: u32,
    prior: Option<Vec<PageNumber>>,
) -> Result<()> {
    let prior: Option<BTreeSet<PageNumber>> = prior.map(|pages| pages.into_iter().collect());
    let window = compute_window(center, page_count, radius, prior.as_ref());

    let payload = WindowOutput {
        center,
        page_count,
        radius,
        rendered: window.rendered,
        visible: window.visible,
    };

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
