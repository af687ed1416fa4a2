use agriweather_core::{
    CancellationToken, Config, Coordinates, Geolocator, LocationSource, LookupState, UvLevel,
    WeatherLookup, geolocation::FixedGeolocator, provider_from_config,
};
use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Select};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "agriweather", version, about = "Current weather for your fields")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the API key and location source.
    Configure,

    /// Show current weather for your location.
    Show {
        /// Latitude in degrees; overrides the configured location source.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude in degrees; overrides the configured location source.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Classify a UV index.
    Uv {
        #[arg(allow_hyphen_values = true)]
        index: f64,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { lat, lon, json } => {
                let fixed = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));
                show(fixed, json).await
            }
            Command::Uv { index } => {
                let level = UvLevel::classify(index);
                println!("{}", render::uv_badge(index, level));
                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("WeatherAPI.com API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        cfg.set_api_key(api_key.trim().to_string());
    }

    cfg.location.allow = Confirm::new("Allow access to your location?")
        .with_default(cfg.location.allow)
        .prompt()
        .context("Failed to read location permission")?;

    if cfg.location.allow {
        let options = vec!["Approximate (from IP address)", "Fixed coordinates", "None"];
        let choice = Select::new("Location source:", options)
            .prompt()
            .context("Failed to read location source")?;

        cfg.location.source = match choice {
            "Fixed coordinates" => {
                let latitude = CustomType::<f64>::new("Latitude:")
                    .prompt()
                    .context("Failed to read latitude")?;
                let longitude = CustomType::<f64>::new("Longitude:")
                    .prompt()
                    .context("Failed to read longitude")?;
                LocationSource::Fixed(Coordinates::new(latitude, longitude))
            }
            "None" => LocationSource::None,
            _ => LocationSource::Ip,
        };
    }

    cfg.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(fixed: Option<Coordinates>, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load()?;

    let geolocator: Box<dyn Geolocator> = match fixed {
        Some(coordinates) => Box::new(FixedGeolocator::new(coordinates)),
        None => cfg.geolocator()?,
    };
    let provider = Box::new(provider_from_config(&cfg));

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    if !json {
        eprintln!("Loading weather data...");
    }

    let state = WeatherLookup::new(geolocator, provider).run(cancel).await;

    match state {
        LookupState::Ready { snapshot, location } => {
            if json {
                println!("{}", render::snapshot_json(&snapshot, &location)?);
            } else {
                print!("{}", render::WeatherCard(&snapshot));
            }
            Ok(())
        }
        LookupState::Failed(err) => {
            tracing::debug!(error = %err, "lookup failed");
            bail!("{}", err.user_message())
        }
        // `run` only returns terminal states.
        LookupState::Cancelled | LookupState::Loading => bail!("Cancelled"),
    }
}
