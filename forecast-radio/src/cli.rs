use anyhow::Context;
use clap::{Parser, Subcommand};
use forecast_core::{Config, Scheduler, broadcaster_from_config};
use inquire::{Password, Text};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::info;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast-radio", version, about = "Timer-driven weather radio")]
pub struct Cli {
    /// Path to config.toml; defaults to the platform config directory.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum Command {
    /// Broadcast at startup, then on every cadence until interrupted (default).
    Run,

    /// Broadcast once and exit.
    Once,

    /// Interactively store station and service credentials.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let Cli { config, command, .. } = self;

        match command.unwrap_or(Command::Run) {
            Command::Configure => configure(config.as_deref()),
            Command::Once => {
                let scheduler = build_scheduler(config.as_deref())?;
                scheduler.run_startup().await;
                Ok(())
            }
            Command::Run => {
                let mut scheduler = build_scheduler(config.as_deref())?;
                scheduler.launch().await;

                tokio::signal::ctrl_c()
                    .await
                    .context("Failed to listen for ctrl-c")?;
                info!("shutting down");
                scheduler.shutdown();
                Ok(())
            }
        }
    }
}

fn config_path(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::config_file_path(),
    }
}

/// Config file, then environment overrides.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let path = config_path(explicit)?;
    let mut config = Config::load_from(&path)?;
    config.apply_env();
    info!(path = %path.display(), output_dir = %config.output_dir.display(), "configuration loaded");
    Ok(config)
}

fn build_scheduler(explicit: Option<&Path>) -> anyhow::Result<Scheduler> {
    let config = load_config(explicit)?;
    let broadcaster = broadcaster_from_config(&config)?;
    Ok(Scheduler::new(Arc::new(broadcaster))?)
}

fn configure(explicit: Option<&Path>) -> anyhow::Result<()> {
    let path = config_path(explicit)?;
    let mut config = Config::load_from(&path)?;

    let station = Text::new("Tempest station id:")
        .with_initial_value(config.station_id.as_deref().unwrap_or_default())
        .prompt()?;
    if !station.trim().is_empty() {
        config.station_id = Some(station.trim().to_string());
    }

    let token = Password::new("Tempest access token (blank keeps current):")
        .without_confirmation()
        .prompt()?;
    if !token.trim().is_empty() {
        config.token = Some(token.trim().to_string());
    }

    let api_key = Password::new("OpenAI API key (blank keeps current):")
        .without_confirmation()
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.narration.api_key = Some(api_key.trim().to_string());
    }

    let zone = Text::new("Station timezone, e.g. America/Chicago (blank for host zone):")
        .with_initial_value(config.timezone.as_deref().unwrap_or_default())
        .prompt()?;
    config.timezone = Some(zone.trim().to_string()).filter(|z| !z.is_empty());
    config.zone()?;

    config.save_to(&path)?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}
