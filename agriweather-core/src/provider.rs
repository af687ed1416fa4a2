use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    Config, Coordinates, WeatherSnapshot, provider::weatherapi::WeatherApiProvider,
};

pub mod weatherapi;

/// Why a current-conditions request produced no snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Transport failure or non-success HTTP status.
    #[error("weather request failed: {0}")]
    Network(String),
    /// Body could not be decoded, or lacked `location`/`current`.
    #[error("weather response could not be parsed: {0}")]
    Parse(String),
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, coordinates: &Coordinates) -> Result<WeatherSnapshot, FetchError>;
}

/// Construct the provider from config.
///
/// A missing API key is not an error here: the request is sent with an empty
/// key and the provider rejects it.
pub fn provider_from_config(config: &Config) -> WeatherApiProvider {
    let api_key = config.api_key().unwrap_or_default().to_owned();
    if api_key.is_empty() {
        tracing::warn!("no weather API key configured; the provider will reject the request");
    }

    match config.base_url.as_deref() {
        Some(base_url) => WeatherApiProvider::with_base_url(api_key, base_url),
        None => WeatherApiProvider::new(api_key),
    }
}
