use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    geolocation::{DeniedGeolocator, FixedGeolocator, Geolocator, IpGeolocator, UnsupportedGeolocator},
    model::Coordinates,
};

/// Environment variable that overrides the API key stored on disk.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

/// Where the current position comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    /// Approximate position from the public IP address.
    #[default]
    Ip,
    /// A fixed position entered by the user.
    Fixed(Coordinates),
    /// No position source; lookups fail as unsupported.
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Whether the user allows the app to read their location.
    #[serde(default = "default_allow")]
    pub allow: bool,

    #[serde(default)]
    pub source: LocationSource,
}

fn default_allow() -> bool {
    true
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self { allow: true, source: LocationSource::default() }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
///
/// [location]
/// allow = true
/// source = { fixed = { latitude = 19.99, longitude = 73.79 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,

    /// Override for the provider endpoint, e.g. a local mock.
    pub base_url: Option<String>,

    #[serde(default)]
    pub location: LocationConfig,

    #[serde(skip)]
    env_api_key: Option<String>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let cfg = Self::load_from(&path)?;
        Ok(cfg.with_env_key(std::env::var(API_KEY_ENV).ok()))
    }

    /// Apply the value of `WEATHER_API_KEY`. An empty value counts as unset.
    pub fn with_env_key(mut self, value: Option<String>) -> Self {
        self.env_api_key = value.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "kushagra", "agriadvisor")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// API key to use: the environment wins over the file.
    pub fn api_key(&self) -> Option<&str> {
        self.env_api_key.as_deref().or(self.api_key.as_deref())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Build the position source described by this config.
    ///
    /// Denied permission takes precedence over any configured source.
    pub fn geolocator(&self) -> Result<Box<dyn Geolocator>> {
        if !self.location.allow {
            return Ok(Box::new(DeniedGeolocator));
        }

        let geolocator: Box<dyn Geolocator> = match self.location.source {
            LocationSource::Ip => {
                Box::new(IpGeolocator::new().context("Failed to build IP geolocation client")?)
            }
            LocationSource::Fixed(coordinates) => Box::new(FixedGeolocator::new(coordinates)),
            LocationSource::None => Box::new(UnsupportedGeolocator),
        };

        Ok(geolocator)
    }
}
