use serde::{Deserialize, Serialize};

/// UV exposure band derived from a UV index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UvLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvLevel {
    /// Classify a UV index. Upper bounds are inclusive, so a value sitting on
    /// a boundary lands in the lower band. NaN compares false everywhere and
    /// ends up `Extreme`.
    pub fn classify(uv: f64) -> Self {
        if uv <= 2.0 {
            UvLevel::Low
        } else if uv <= 5.0 {
            UvLevel::Moderate
        } else if uv <= 7.0 {
            UvLevel::High
        } else if uv <= 10.0 {
            UvLevel::VeryHigh
        } else {
            UvLevel::Extreme
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UvLevel::Low => "Low",
            UvLevel::Moderate => "Moderate",
            UvLevel::High => "High",
            UvLevel::VeryHigh => "Very High",
            UvLevel::Extreme => "Extreme",
        }
    }

    /// Badge colour used when rendering the level.
    pub fn style_class(&self) -> &'static str {
        match self {
            UvLevel::Low => "green",
            UvLevel::Moderate => "yellow",
            UvLevel::High => "orange",
            UvLevel::VeryHigh => "red",
            UvLevel::Extreme => "purple",
        }
    }

    pub const fn all() -> &'static [UvLevel] {
        &[UvLevel::Low, UvLevel::Moderate, UvLevel::High, UvLevel::VeryHigh, UvLevel::Extreme]
    }
}

impl std::fmt::Display for UvLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
