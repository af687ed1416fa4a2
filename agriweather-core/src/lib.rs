//! Core library for the AgriAdvisor weather lookup.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Position sources (geolocation)
//! - The WeatherAPI.com current-conditions provider
//! - UV index classification
//! - The single-shot lookup flow tying them together
//!
//! It is used by `agriweather-cli`, but can also be embedded in other front-ends.

pub mod config;
pub mod geolocation;
pub mod lookup;
pub mod model;
pub mod provider;
pub mod uv;

pub use config::{Config, LocationConfig, LocationSource};
pub use geolocation::{GeolocationError, Geolocator};
pub use lookup::{LookupError, LookupHandle, LookupState, WeatherLookup};
pub use model::{Condition, Coordinates, WeatherSnapshot};
pub use provider::{FetchError, WeatherProvider, provider_from_config};
pub use tokio_util::sync::CancellationToken;
pub use uv::UvLevel;
