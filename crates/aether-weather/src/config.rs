//! Weather configuration.
//!
//! Mirrors the `weather:` section of `aether-config.yaml`. Every field has a
//! default, so an empty section yields a working engine.

use std::collections::BTreeMap;

use aether_types::{WeatherCategory, WeatherIntensity, WeatherType};
use serde::Deserialize;

use crate::error::WeatherError;

/// Tolerance when checking that category weights do not exceed one.
const WEIGHT_SUM_TOLERANCE: f32 = 1e-4;

/// Weather engine configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherConfig {
    /// Condition in effect at startup.
    #[serde(default = "default_initial")]
    pub initial: WeatherType,

    /// Whether the engine schedules random weather changes on its own.
    #[serde(default = "default_true")]
    pub auto_change: bool,

    /// Lower bound of the delay between automatic changes.
    #[serde(default = "default_min_change_interval")]
    pub min_change_interval_seconds: f32,

    /// Upper bound of the delay between automatic changes.
    #[serde(default = "default_max_change_interval")]
    pub max_change_interval_seconds: f32,

    /// Duration of a non-instant transition.
    #[serde(default = "default_transition_duration")]
    pub transition_duration_seconds: f32,

    /// Category weights for automatic changes.
    #[serde(default)]
    pub weights: WeatherWeights,

    /// Lower bound of the delay between lightning strikes.
    #[serde(default = "default_lightning_min")]
    pub lightning_min_interval_seconds: f32,

    /// Upper bound of the delay between lightning strikes.
    #[serde(default = "default_lightning_max")]
    pub lightning_max_interval_seconds: f32,

    /// Lower bound of the delay between a flash and its thunder cue.
    #[serde(default = "default_thunder_min")]
    pub thunder_min_delay_seconds: f32,

    /// Upper bound of the delay between a flash and its thunder cue.
    #[serde(default = "default_thunder_max")]
    pub thunder_max_delay_seconds: f32,

    /// Per-type replacements for canonical parameters.
    #[serde(default)]
    pub overrides: BTreeMap<WeatherType, ConditionOverride>,

    /// Types removed from the catalog entirely.
    #[serde(default)]
    pub disabled: Vec<WeatherType>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            initial: default_initial(),
            auto_change: true,
            min_change_interval_seconds: default_min_change_interval(),
            max_change_interval_seconds: default_max_change_interval(),
            transition_duration_seconds: default_transition_duration(),
            weights: WeatherWeights::default(),
            lightning_min_interval_seconds: default_lightning_min(),
            lightning_max_interval_seconds: default_lightning_max(),
            thunder_min_delay_seconds: default_thunder_min(),
            thunder_max_delay_seconds: default_thunder_max(),
            overrides: BTreeMap::new(),
            disabled: Vec::new(),
        }
    }
}

impl WeatherConfig {
    /// Check intervals, durations, weights, and overrides for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<(), WeatherError> {
        check_interval(
            "change interval",
            self.min_change_interval_seconds,
            self.max_change_interval_seconds,
        )?;
        check_interval(
            "lightning interval",
            self.lightning_min_interval_seconds,
            self.lightning_max_interval_seconds,
        )?;
        check_interval(
            "thunder delay",
            self.thunder_min_delay_seconds,
            self.thunder_max_delay_seconds,
        )?;
        if !self.transition_duration_seconds.is_finite() || self.transition_duration_seconds < 0.0
        {
            return Err(WeatherError::InvalidConfig {
                reason: format!(
                    "transition_duration_seconds must be >= 0, got {}",
                    self.transition_duration_seconds
                ),
            });
        }
        if self.disabled.contains(&self.initial) {
            return Err(WeatherError::InvalidConfig {
                reason: format!("initial weather {} is disabled", self.initial),
            });
        }
        for (kind, replacement) in &self.overrides {
            replacement.validate(*kind)?;
        }
        self.weights.validate()
    }
}

fn check_interval(name: &str, min: f32, max: f32) -> Result<(), WeatherError> {
    if !min.is_finite() || !max.is_finite() || min <= 0.0 || min > max {
        return Err(WeatherError::InvalidConfig {
            reason: format!("{name} must satisfy 0 < min <= max, got [{min}, {max}]"),
        });
    }
    Ok(())
}

/// Category weights for automatic weather changes.
///
/// Weights are probabilities. Whatever the listed weights leave below one
/// is assigned to clear weather.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WeatherWeights {
    /// Weight of clear weather.
    #[serde(default = "default_clear_weight")]
    pub clear: f32,
    /// Weight of the cloudy family.
    #[serde(default = "default_cloudy_weight")]
    pub cloudy: f32,
    /// Weight of the rain family.
    #[serde(default = "default_rain_weight")]
    pub rain: f32,
    /// Weight of thunderstorms.
    #[serde(default = "default_storm_weight")]
    pub storm: f32,
    /// Weight of fog.
    #[serde(default = "default_fog_weight")]
    pub fog: f32,
    /// Weight of the snow family.
    #[serde(default)]
    pub snow: f32,
}

impl Default for WeatherWeights {
    fn default() -> Self {
        Self {
            clear: default_clear_weight(),
            cloudy: default_cloudy_weight(),
            rain: default_rain_weight(),
            storm: default_storm_weight(),
            fog: default_fog_weight(),
            snow: 0.0,
        }
    }
}

impl WeatherWeights {
    /// Weighted entries in sampling order.
    pub const fn entries(&self) -> [(WeatherCategory, f32); 6] {
        [
            (WeatherCategory::Clear, self.clear),
            (WeatherCategory::Cloudy, self.cloudy),
            (WeatherCategory::Rain, self.rain),
            (WeatherCategory::Storm, self.storm),
            (WeatherCategory::Fog, self.fog),
            (WeatherCategory::Snow, self.snow),
        ]
    }

    /// Sum of all listed weights.
    pub fn total(&self) -> f32 {
        self.entries().iter().map(|&(_, weight)| weight).sum()
    }

    /// Check that every weight is a finite probability and the sum is at
    /// most one.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::InvalidConfig`] on a negative, non-finite, or
    /// over-allocated weight table.
    pub fn validate(&self) -> Result<(), WeatherError> {
        for (category, weight) in self.entries() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(WeatherError::InvalidConfig {
                    reason: format!("weight for {category:?} must be >= 0, got {weight}"),
                });
            }
        }
        let total = self.total();
        if total > 1.0 + WEIGHT_SUM_TOLERANCE {
            return Err(WeatherError::InvalidConfig {
                reason: format!("weather weights sum to {total}, which exceeds 1"),
            });
        }
        Ok(())
    }
}

/// Replacement values for a canonical condition. Absent fields keep the
/// built-in value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ConditionOverride {
    /// Replacement intensity tier.
    #[serde(default)]
    pub intensity: Option<WeatherIntensity>,
    /// Replacement cloud coverage.
    #[serde(default)]
    pub cloud_coverage: Option<f32>,
    /// Replacement precipitation.
    #[serde(default)]
    pub precipitation: Option<f32>,
    /// Replacement wind speed.
    #[serde(default)]
    pub wind_speed: Option<f32>,
    /// Replacement wind direction in degrees.
    #[serde(default)]
    pub wind_direction: Option<f32>,
    /// Replacement visibility.
    #[serde(default)]
    pub visibility: Option<f32>,
    /// Replacement temperature in degrees Celsius.
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Replacement humidity.
    #[serde(default)]
    pub humidity: Option<f32>,
}

impl ConditionOverride {
    fn entries(&self) -> [(&'static str, Option<f32>); 7] {
        [
            ("cloud_coverage", self.cloud_coverage),
            ("precipitation", self.precipitation),
            ("wind_speed", self.wind_speed),
            ("wind_direction", self.wind_direction),
            ("visibility", self.visibility),
            ("temperature", self.temperature),
            ("humidity", self.humidity),
        ]
    }

    /// Reject non-finite replacement values.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self, kind: WeatherType) -> Result<(), WeatherError> {
        for (field, value) in self.entries() {
            if let Some(value) = value.filter(|v| !v.is_finite()) {
                return Err(WeatherError::InvalidConfig {
                    reason: format!("override {kind}.{field} must be finite, got {value}"),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_initial() -> WeatherType {
    WeatherType::Clear
}

const fn default_true() -> bool {
    true
}

const fn default_min_change_interval() -> f32 {
    300.0
}

const fn default_max_change_interval() -> f32 {
    900.0
}

const fn default_transition_duration() -> f32 {
    30.0
}

const fn default_lightning_min() -> f32 {
    5.0
}

const fn default_lightning_max() -> f32 {
    20.0
}

const fn default_thunder_min() -> f32 {
    0.5
}

const fn default_thunder_max() -> f32 {
    3.0
}

const fn default_clear_weight() -> f32 {
    0.4
}

const fn default_cloudy_weight() -> f32 {
    0.25
}

const fn default_rain_weight() -> f32 {
    0.2
}

const fn default_storm_weight() -> f32 {
    0.1
}

const fn default_fog_weight() -> f32 {
    0.05
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = WeatherConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.weights.total() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn inverted_interval_is_rejected() {
        let config = WeatherConfig {
            min_change_interval_seconds: 100.0,
            max_change_interval_seconds: 10.0,
            ..WeatherConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(WeatherError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn over_allocated_weights_are_rejected() {
        let weights = WeatherWeights {
            clear: 0.9,
            cloudy: 0.5,
            ..WeatherWeights::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn negative_weight_is_rejected() {
        let weights = WeatherWeights {
            fog: -0.1,
            ..WeatherWeights::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn disabled_initial_weather_is_rejected() {
        let config = WeatherConfig {
            initial: WeatherType::Snow,
            disabled: vec![WeatherType::Snow],
            ..WeatherConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_finite_override_is_rejected() {
        let yaml = r"
overrides:
  foggy:
    visibility: .nan
";
        let config: WeatherConfig = serde_yml::from_str(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("visibility"), "{err}");

        let mut config = WeatherConfig::default();
        config.overrides.insert(
            WeatherType::Rain,
            ConditionOverride {
                temperature: Some(f32::INFINITY),
                ..ConditionOverride::default()
            },
        );
        assert!(config.validate().is_err());

        config.overrides.insert(
            WeatherType::Rain,
            ConditionOverride {
                temperature: Some(9.0),
                ..ConditionOverride::default()
            },
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
initial: overcast
auto_change: false
weights:
  storm: 0.0
overrides:
  thunderstorm:
    visibility: 0.2
disabled: [blizzard]
";
        let config: WeatherConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.initial, WeatherType::Overcast);
        assert!(!config.auto_change);
        assert!(config.weights.storm.abs() < f32::EPSILON);
        assert!((config.weights.clear - 0.4).abs() < f32::EPSILON);
        assert_eq!(
            config
                .overrides
                .get(&WeatherType::Thunderstorm)
                .and_then(|o| o.visibility),
            Some(0.2)
        );
        assert_eq!(config.disabled, vec![WeatherType::Blizzard]);
        assert!((config.transition_duration_seconds - 30.0).abs() < f32::EPSILON);
    }
}
