//! Weather simulation for the Aether environment.
//!
//! The [`WeatherEngine`] owns the current and target weather condition, runs
//! timed interpolated transitions between conditions, schedules randomized
//! weather changes from a weighted category table, and drives lightning while
//! a thunderstorm is in effect.
//!
//! # Modules
//!
//! - [`catalog`] -- Canonical parameter set for every [`WeatherType`], with
//!   configuration overrides.
//! - [`condition`] -- Blending between two conditions.
//! - [`config`] -- [`WeatherConfig`] and its defaults.
//! - [`engine`] -- The [`WeatherEngine`] state machine.
//! - [`error`] -- Error types for weather operations.
//! - [`lightning`] -- Strike scheduling, flash sequence, thunder cues.
//! - [`sampler`] -- Weighted category sampling for automatic changes.
//!
//! [`WeatherType`]: aether_types::WeatherType

pub mod catalog;
pub mod condition;
pub mod config;
pub mod engine;
pub mod error;
pub mod lightning;
pub mod sampler;

// Re-export primary types at crate root.
pub use catalog::WeatherCatalog;
pub use condition::{blend, lerp_angle};
pub use config::{ConditionOverride, WeatherConfig, WeatherWeights};
pub use engine::{WeatherEngine, WeatherState, WeatherTransition};
pub use error::WeatherError;
pub use sampler::WeatherSampler;
