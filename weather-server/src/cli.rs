use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use weather_core::{Config, WeatherFacade};

use crate::{http, logging};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-server", version, about = "Cached weather lookups over Open-Meteo")]
pub struct Cli {
    /// Config file; defaults to config.toml in the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service.
    Serve,

    /// Look up the weather once and print it as JSON.
    Lookup {
        #[arg(
            long,
            allow_hyphen_values = true,
            required_unless_present = "city",
            requires = "longitude"
        )]
        latitude: Option<f64>,

        #[arg(
            long,
            allow_hyphen_values = true,
            required_unless_present = "city",
            requires = "latitude"
        )]
        longitude: Option<f64>,

        /// Place name to geocode instead of coordinates.
        #[arg(long, conflicts_with_all = ["latitude", "longitude"])]
        city: Option<String>,
    },

    /// Write a config file with default values.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };

        match self.command {
            Command::InitConfig { force } => {
                logging::init("info");
                init_config(&path, force)
            }
            Command::Serve => {
                let (config, facade) = prepare(&path)?;
                http::serve(&config, facade).await
            }
            Command::Lookup { latitude, longitude, city } => {
                let (_, facade) = prepare(&path)?;
                let observation = match (city, latitude, longitude) {
                    (Some(city), _, _) => facade.by_place_name(&city).await?,
                    (None, Some(lat), Some(lon)) => facade.by_coordinate(lat, lon).await?,
                    _ => bail!("either --city or both --latitude and --longitude are required"),
                };
                let json = serde_json::to_string_pretty(&observation)
                    .context("Failed to serialize observation")?;
                println!("{json}");
                Ok(())
            }
        }
    }
}

/// Load config, start logging and wire the core.
fn prepare(path: &Path) -> anyhow::Result<(Config, WeatherFacade)> {
    let config = Config::load_from(path)?;
    logging::init(&config.logging.level);
    let facade = WeatherFacade::from_config(&config)?;
    Ok((config, facade))
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file already exists: {}\nHint: pass --force to overwrite it.",
            path.display()
        );
    }

    Config::default().save_to(path)?;
    tracing::info!(path = %path.display(), "wrote default config");
    Ok(())
}
