//! Shared type definitions for the Aether environment simulation.
//!
//! This crate is the single source of truth for the value types exchanged
//! between the time clock, the weather engine, the environment aggregator,
//! and every collaborator that reads their output.
//!
//! # Modules
//!
//! - [`enums`] -- Day periods, advance modes, weather types, categories and
//!   intensity tiers
//! - [`structs`] -- Weather conditions, evaluated time lighting, and the
//!   published environment snapshot
//! - [`events`] -- Events broadcast by the three simulation components

pub mod enums;
pub mod events;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    AdvanceMode, Period, UnknownWeatherType, WeatherCategory, WeatherIntensity, WeatherType,
};
pub use events::{
    ClockEvent, ClockEventKind, EnvironmentEvent, EnvironmentEventKind, WeatherEvent,
    WeatherEventKind,
};
pub use structs::{EnvironmentSnapshot, TimeLighting, WeatherCondition};

/// Number of hours in one simulated day.
pub const HOURS_PER_DAY: f32 = 24.0;
