mod app;

use app::App;
use clap::Parser;
use radeontop::{create_monitor, MonitorConfig, MonitorResult};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "radeontop")]
#[command(about = "AMD GPU utilization, VRAM and sensor readings")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// DRM class directory holding the cardN entries
    #[arg(long)]
    drm_root: Option<PathBuf>,

    /// lm-sensors executable
    #[arg(long)]
    sensors_program: Option<String>,

    /// Time between polls in milliseconds
    #[arg(short, long, default_value = "1000")]
    interval_ms: u64,

    /// Number of polls, 0 for no limit
    #[arg(short = 'n', long, default_value = "0")]
    count: u64,

    /// Print each snapshot as one JSON line
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = build_config(&cli)?;
    let monitor = create_monitor(&config);
    App::new(
        monitor,
        Duration::from_millis(cli.interval_ms),
        cli.count,
        cli.json,
    )
    .run()?;

    Ok(())
}

/// Config file values, then command line overrides.
fn build_config(cli: &Cli) -> MonitorResult<MonitorConfig> {
    let mut config = match &cli.config {
        Some(path) => MonitorConfig::from_file(path)?,
        None => MonitorConfig::default(),
    };
    if let Some(root) = &cli.drm_root {
        config = config.with_drm_root(root);
    }
    if let Some(program) = &cli.sensors_program {
        config = config.with_sensors_program(program);
    }
    Ok(config)
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("radeontop={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
