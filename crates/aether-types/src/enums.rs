//! Enumeration types for the environment simulation.
//!
//! Every enum serializes as `snake_case` so configuration files and logs use
//! the same spelling (`partly_cloudy`, `accelerated_simulation`, ...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Discrete part of the day, derived from the hour and four boundary hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// From dusk end, wrapping through midnight, to dawn start.
    Night,
    /// From dawn start to dawn end.
    Dawn,
    /// From dawn end to dusk start.
    Day,
    /// From dusk start to dusk end.
    Dusk,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Night => "night",
            Self::Dawn => "dawn",
            Self::Day => "day",
            Self::Dusk => "dusk",
        };
        f.write_str(name)
    }
}

/// Strategy the time clock uses to move the hour forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceMode {
    /// The hour is re-read from the wall clock on every advance.
    RealTimeSync,
    /// The hour is integrated from frame deltas at a configurable speed.
    #[default]
    AcceleratedSimulation,
    /// The hour is held at a caller-provided override value.
    ManualOverride,
    /// The hour does not change.
    Paused,
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// Named weather condition. Each type maps to one canonical parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherType {
    /// Open sky.
    Clear,
    /// Scattered clouds.
    PartlyCloudy,
    /// Mostly covered sky.
    Cloudy,
    /// Fully covered, flat grey sky.
    Overcast,
    /// Low visibility, still air.
    Foggy,
    /// Drizzle.
    LightRain,
    /// Steady rain.
    Rain,
    /// Downpour.
    HeavyRain,
    /// Heavy rain with lightning.
    Thunderstorm,
    /// Snowfall.
    Snow,
    /// Snowfall with strong wind and near-zero visibility.
    Blizzard,
}

impl WeatherType {
    /// Every weather type, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Clear,
        Self::PartlyCloudy,
        Self::Cloudy,
        Self::Overcast,
        Self::Foggy,
        Self::LightRain,
        Self::Rain,
        Self::HeavyRain,
        Self::Thunderstorm,
        Self::Snow,
        Self::Blizzard,
    ];

    /// The sampling category this type belongs to.
    pub const fn category(self) -> WeatherCategory {
        match self {
            Self::Clear => WeatherCategory::Clear,
            Self::PartlyCloudy | Self::Cloudy | Self::Overcast => WeatherCategory::Cloudy,
            Self::Foggy => WeatherCategory::Fog,
            Self::LightRain | Self::Rain | Self::HeavyRain => WeatherCategory::Rain,
            Self::Thunderstorm => WeatherCategory::Storm,
            Self::Snow | Self::Blizzard => WeatherCategory::Snow,
        }
    }

    /// Whether lightning can strike while this type is current.
    pub const fn has_lightning(self) -> bool {
        matches!(self, Self::Thunderstorm)
    }

    /// The `snake_case` name used in configuration and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::PartlyCloudy => "partly_cloudy",
            Self::Cloudy => "cloudy",
            Self::Overcast => "overcast",
            Self::Foggy => "foggy",
            Self::LightRain => "light_rain",
            Self::Rain => "rain",
            Self::HeavyRain => "heavy_rain",
            Self::Thunderstorm => "thunderstorm",
            Self::Snow => "snow",
            Self::Blizzard => "blizzard",
        }
    }
}

impl fmt::Display for WeatherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A weather name that does not match any [`WeatherType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown weather type: {0}")]
pub struct UnknownWeatherType(pub String);

impl FromStr for WeatherType {
    type Err = UnknownWeatherType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| UnknownWeatherType(s.to_owned()))
    }
}

/// Coarse weather family used by weighted random sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCategory {
    /// [`WeatherType::Clear`].
    Clear,
    /// Partly cloudy, cloudy, or overcast.
    Cloudy,
    /// Light rain, rain, or heavy rain.
    Rain,
    /// Thunderstorm.
    Storm,
    /// Fog.
    Fog,
    /// Snow or blizzard.
    Snow,
}

impl WeatherCategory {
    /// The concrete types a draw from this category can produce.
    pub const fn members(self) -> &'static [WeatherType] {
        match self {
            Self::Clear => &[WeatherType::Clear],
            Self::Cloudy => &[
                WeatherType::PartlyCloudy,
                WeatherType::Cloudy,
                WeatherType::Overcast,
            ],
            Self::Rain => &[WeatherType::LightRain, WeatherType::Rain, WeatherType::HeavyRain],
            Self::Storm => &[WeatherType::Thunderstorm],
            Self::Fog => &[WeatherType::Foggy],
            Self::Snow => &[WeatherType::Snow, WeatherType::Blizzard],
        }
    }
}

/// Severity tier attached to every weather condition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WeatherIntensity {
    /// No active weather.
    #[default]
    None,
    /// Mild.
    Light,
    /// Noticeable.
    Moderate,
    /// Strong.
    Heavy,
    /// Dangerous.
    Extreme,
}
