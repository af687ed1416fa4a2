use agriweather_core::{UvLevel, WeatherSnapshot};
use std::fmt;

pub fn uv_badge(uv: f64, level: UvLevel) -> String {
    format!("{uv} - {}", level.label())
}

/// Multi-line text card for one snapshot.
pub struct WeatherCard<'a>(pub &'a WeatherSnapshot);

impl fmt::Display for WeatherCard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;

        writeln!(f, "Weather in {}", snapshot.location_label())?;
        writeln!(f, "  {}", snapshot.condition.text)?;
        if let Some(icon) = snapshot.condition.icon_url() {
            writeln!(f, "  Icon:       {icon}")?;
        }
        writeln!(f, "  Temp:       {} °C", snapshot.temperature_c)?;
        writeln!(f, "  Humidity:   {}%", snapshot.humidity_pct)?;
        writeln!(f, "  Wind:       {} km/h {}", snapshot.wind_kph, snapshot.wind_dir)?;
        writeln!(f, "  Pressure:   {} hPa", snapshot.pressure_mb)?;
        writeln!(f, "  Visibility: {} km", snapshot.visibility_km)?;
        writeln!(f, "  UV Index:   {}", uv_badge(snapshot.uv_index, snapshot.uv_level()))?;
        if let Some(observed) = snapshot.observed_at {
            writeln!(f, "  Updated:    {}", observed.format("%Y-%m-%d %H:%M UTC"))?;
        }

        Ok(())
    }
}

pub fn snapshot_json(snapshot: &WeatherSnapshot, location: &str) -> anyhow::Result<String> {
    let level = snapshot.uv_level();
    let value = serde_json::json!({
        "location": location,
        "snapshot": snapshot,
        "icon_url": snapshot.condition.icon_url(),
        "uv_level": {
            "label": level.label(),
            "style": level.style_class(),
        },
    });

    Ok(serde_json::to_string_pretty(&value)?)
}
