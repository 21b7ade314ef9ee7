//! Canonical weather parameter sets.
//!
//! Every [`WeatherType`] maps to exactly one [`WeatherCondition`]. The
//! built-in table below is the default; configuration may override fields
//! per type or remove types. A request for a type missing from the catalog
//! is rejected by the engine.
//!
//! | Type          | Cloud | Precip | Wind | Dir | Vis  | Temp | Hum  |
//! |---------------|-------|--------|------|-----|------|------|------|
//! | Clear         | 0.10  | 0.00   | 0.10 | 180 | 1.00 |  22  | 0.40 |
//! | PartlyCloudy  | 0.35  | 0.00   | 0.20 | 200 | 0.95 |  20  | 0.50 |
//! | Cloudy        | 0.65  | 0.00   | 0.30 | 220 | 0.85 |  17  | 0.60 |
//! | Overcast      | 0.90  | 0.00   | 0.35 | 230 | 0.75 |  15  | 0.70 |
//! | Foggy         | 0.60  | 0.00   | 0.05 |  90 | 0.20 |  12  | 0.95 |
//! | LightRain     | 0.70  | 0.30   | 0.35 | 240 | 0.70 |  14  | 0.80 |
//! | Rain          | 0.85  | 0.60   | 0.50 | 250 | 0.55 |  12  | 0.90 |
//! | HeavyRain     | 0.95  | 0.90   | 0.70 | 260 | 0.35 |  11  | 0.95 |
//! | Thunderstorm  | 1.00  | 1.00   | 0.90 | 270 | 0.30 |  18  | 0.95 |
//! | Snow          | 0.85  | 0.50   | 0.30 |   0 | 0.50 |  -3  | 0.80 |
//! | Blizzard      | 1.00  | 0.95   | 1.00 | 340 | 0.10 | -12  | 0.85 |

use std::collections::BTreeMap;

use aether_types::{WeatherCondition, WeatherIntensity, WeatherType};

use crate::config::{ConditionOverride, WeatherConfig};

/// Lookup table from weather type to canonical condition.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherCatalog {
    conditions: BTreeMap<WeatherType, WeatherCondition>,
}

impl WeatherCatalog {
    /// The complete built-in table.
    pub fn builtin() -> Self {
        let conditions = WeatherType::ALL
            .into_iter()
            .map(|kind| (kind, canonical(kind)))
            .collect();
        Self { conditions }
    }

    /// The built-in table with the configuration's overrides applied and
    /// disabled types removed.
    pub fn from_config(config: &WeatherConfig) -> Self {
        let mut catalog = Self::builtin();
        for (kind, replacement) in &config.overrides {
            if let Some(condition) = catalog.conditions.get_mut(kind) {
                apply_override(condition, replacement);
            }
        }
        for kind in &config.disabled {
            catalog.conditions.remove(kind);
        }
        catalog
    }

    /// The canonical condition for `kind`, if the catalog contains it.
    pub fn get(&self, kind: WeatherType) -> Option<WeatherCondition> {
        self.conditions.get(&kind).copied()
    }

    /// Whether the catalog contains `kind`.
    pub fn contains(&self, kind: WeatherType) -> bool {
        self.conditions.contains_key(&kind)
    }

    /// Types present in the catalog, in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = WeatherType> + '_ {
        self.conditions.keys().copied()
    }

    /// Number of types in the catalog.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl Default for WeatherCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Built-in canonical condition for a weather type.
pub const fn canonical(kind: WeatherType) -> WeatherCondition {
    let (intensity, cloud, precip, wind, dir, vis, temp, hum) = match kind {
        WeatherType::Clear => (WeatherIntensity::None, 0.10, 0.00, 0.10, 180.0, 1.00, 22.0, 0.40),
        WeatherType::PartlyCloudy => {
            (WeatherIntensity::Light, 0.35, 0.00, 0.20, 200.0, 0.95, 20.0, 0.50)
        }
        WeatherType::Cloudy => {
            (WeatherIntensity::Moderate, 0.65, 0.00, 0.30, 220.0, 0.85, 17.0, 0.60)
        }
        WeatherType::Overcast => (WeatherIntensity::Heavy, 0.90, 0.00, 0.35, 230.0, 0.75, 15.0, 0.70),
        WeatherType::Foggy => (WeatherIntensity::Moderate, 0.60, 0.00, 0.05, 90.0, 0.20, 12.0, 0.95),
        WeatherType::LightRain => (WeatherIntensity::Light, 0.70, 0.30, 0.35, 240.0, 0.70, 14.0, 0.80),
        WeatherType::Rain => (WeatherIntensity::Moderate, 0.85, 0.60, 0.50, 250.0, 0.55, 12.0, 0.90),
        WeatherType::HeavyRain => (WeatherIntensity::Heavy, 0.95, 0.90, 0.70, 260.0, 0.35, 11.0, 0.95),
        WeatherType::Thunderstorm => {
            (WeatherIntensity::Extreme, 1.00, 1.00, 0.90, 270.0, 0.30, 18.0, 0.95)
        }
        WeatherType::Snow => (WeatherIntensity::Moderate, 0.85, 0.50, 0.30, 0.0, 0.50, -3.0, 0.80),
        WeatherType::Blizzard => {
            (WeatherIntensity::Extreme, 1.00, 0.95, 1.00, 340.0, 0.10, -12.0, 0.85)
        }
    };
    WeatherCondition {
        kind,
        intensity,
        cloud_coverage: cloud,
        precipitation: precip,
        wind_speed: wind,
        wind_direction: dir,
        visibility: vis,
        temperature: temp,
        humidity: hum,
    }
}

fn apply_override(condition: &mut WeatherCondition, replacement: &ConditionOverride) {
    if let Some(intensity) = replacement.intensity {
        condition.intensity = intensity;
    }
    if let Some(value) = replacement.cloud_coverage {
        condition.cloud_coverage = value.clamp(0.0, 1.0);
    }
    if let Some(value) = replacement.precipitation {
        condition.precipitation = value.clamp(0.0, 1.0);
    }
    if let Some(value) = replacement.wind_speed {
        condition.wind_speed = value.clamp(0.0, 1.0);
    }
    if let Some(value) = replacement.wind_direction {
        condition.wind_direction = value.rem_euclid(360.0);
    }
    if let Some(value) = replacement.visibility {
        condition.visibility = value.clamp(0.0, 1.0);
    }
    if let Some(value) = replacement.temperature {
        condition.temperature = value;
    }
    if let Some(value) = replacement.humidity {
        condition.humidity = value.clamp(0.0, 1.0);
    }
}
