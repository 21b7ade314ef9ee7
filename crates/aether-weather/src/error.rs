//! Error types for the `aether-weather` crate.

use aether_types::{UnknownWeatherType, WeatherType};

/// Errors that can occur during weather operations.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    /// The requested type has no canonical parameter set in the catalog.
    #[error("weather type {0} is not in the catalog")]
    UnknownCondition(WeatherType),

    /// A weather name did not parse to any known type.
    #[error("{source}")]
    UnknownName {
        /// The underlying parse error.
        #[from]
        source: UnknownWeatherType,
    },

    /// The weather configuration is inconsistent.
    #[error("invalid weather configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}
