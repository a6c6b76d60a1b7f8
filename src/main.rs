//! Shovel - flow list controller for the Shovel capture viewer
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;
use shovel_app::{load_settings, Settings, CONFIG_FILENAME};
use shovel_core::prelude::*;

/// Shovel - headless flow list controller
#[derive(Parser, Debug)]
#[command(name = "shovel")]
#[command(about = "Filter and browse captured network flows from the command line", long_about = None)]
struct Args {
    /// Settings file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Flow API base URL (overrides the settings file)
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Starting location, e.g. a shared link with filter parameters
    #[arg(long, value_name = "URL")]
    location: Option<String>,

    /// Do not subscribe to the push channel
    #[arg(long)]
    no_events: bool,

    /// Log directory (overrides the settings file)
    #[arg(long, value_name = "PATH")]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));
    let (mut settings, load_error) = match load_settings(&config_path) {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };
    if let Some(server) = args.server {
        settings.server.url = server;
    }
    if args.no_events {
        settings.events.enabled = false;
    }
    if let Some(dir) = args.log_dir {
        settings.logging.directory = Some(dir);
    }

    // stdout is reserved for NDJSON, so logs go to a file
    let log_dir = shovel_core::logging::init(&settings.log_options())?;
    eprintln!("Logging to {}", log_dir.display());
    if let Some(e) = load_error {
        warn!("{}; using default settings", e);
    }
    debug!("Settings from {:?}: {:?}", config_path, settings);

    shovel::run_headless(settings, args.location).await?;
    Ok(())
}
