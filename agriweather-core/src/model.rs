use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::uv::UvLevel;

/// A position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Query form accepted by the provider: `"lat,lon"`.
    pub fn to_query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    /// Icon reference as delivered by the provider, usually scheme-relative.
    pub icon: String,
}

impl Condition {
    /// Usable icon URL, or `None` when the provider sent no icon.
    pub fn icon_url(&self) -> Option<String> {
        let icon = self.icon.trim();
        if icon.is_empty() {
            None
        } else if icon.starts_with("//") {
            Some(format!("https:{icon}"))
        } else {
            Some(icon.to_string())
        }
    }
}

/// Current conditions for one location, replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub region: String,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_kph: f64,
    pub wind_dir: String,
    pub pressure_mb: f64,
    pub visibility_km: f64,
    pub uv_index: f64,
    pub condition: Condition,
    pub observed_at: Option<DateTime<Utc>>,
}

impl WeatherSnapshot {
    pub fn location_label(&self) -> String {
        format!("{}, {}", self.location_name, self.region)
    }

    pub fn uv_level(&self) -> UvLevel {
        UvLevel::classify(self.uv_index)
    }
}
