use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ledmap::app::core::{App, RunOptions};
use ledmap::{logging_setup, signals};
use ledmap_core::AppConfig;
use tracing::info;

#[derive(Parser)]
#[command(name = "ledmap")]
#[command(about = "Route ArtNet and LM pixel data to LED strips", long_about = None)]
struct Cli {
    /// Configuration file (TOML); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Record output instead of driving the LED hardware
    #[arg(long)]
    dry_run: bool,

    /// Override the render frame rate
    #[arg(long)]
    fps: Option<u32>,

    /// Override the log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load configuration {:?}", path))?,
        None => AppConfig::default(),
    };
    if let Some(fps) = cli.fps {
        config.render_fps = fps;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate().context("Invalid configuration")?;

    let _log_guard = logging_setup::init(&config.logging)?;

    info!("==========================================");
    info!("===        LedMap Session Started      ===");
    info!("==========================================");

    signals::install().context("Failed to install signal handlers")?;

    let app = App::new(
        config,
        RunOptions {
            config_path: cli.config,
            dry_run: cli.dry_run,
        },
    )?;
    app.run()
}
