//! The composed environment simulation.
//!
//! A [`Simulation`] owns one [`TimeClock`], one [`WeatherEngine`], and one
//! [`EnvironmentAggregator`] and steps them in a fixed order:
//!
//! 1. **Clock** -- advance the hour and fire clock events.
//! 2. **Weather** -- advance transitions, schedules, and lightning.
//! 3. **Aggregate** -- recompute and publish the environment snapshot.
//!
//! Every snapshot is therefore computed from the clock and weather state of
//! the same step. Commands (mode switches, time jumps, weather requests)
//! apply immediately and are reflected by the next publication.

use std::sync::Arc;

use aether_types::{AdvanceMode, EnvironmentSnapshot, Period, WeatherType};
use aether_weather::{WeatherEngine, WeatherError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregator::{EnvironmentAggregator, SkyError};
use crate::clock::{ClockError, TimeClock};
use crate::config::SimulationConfig;
use crate::snapshot::SnapshotReader;
use crate::time_source::{SystemTimeSource, TimeSource};

/// Errors that can occur when assembling a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The time clock rejected its configuration.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The weather engine rejected its configuration.
    #[error("weather error: {source}")]
    Weather {
        /// The underlying weather error.
        #[from]
        source: WeatherError,
    },

    /// The aggregator rejected its configuration.
    #[error("sky error: {source}")]
    Sky {
        /// The underlying sky error.
        #[from]
        source: SkyError,
    },

    /// The configured UTC offset is not a valid time zone offset.
    #[error("invalid utc offset: {hours} hours")]
    InvalidUtcOffset {
        /// The rejected offset in hours.
        hours: f32,
    },
}

/// Summary of one simulation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSummary {
    /// Step number, starting at 1.
    pub step: u64,
    /// Hour of day after the step.
    pub hour: f32,
    /// Period after the step.
    pub period: Period,
    /// Weather type currently in effect.
    pub weather: WeatherType,
    /// Whether a weather transition is in progress.
    pub transitioning: bool,
    /// Sequence of the snapshot published by this step, if any.
    pub published: Option<u64>,
}

/// Clock, weather, and aggregator driven together.
#[derive(Debug)]
pub struct Simulation {
    clock: TimeClock,
    weather: WeatherEngine,
    aggregator: EnvironmentAggregator,
    steps: u64,
}

impl Simulation {
    /// Build a simulation from configuration, reading wall-clock time from
    /// the system.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError`] if any component rejects its section of
    /// the configuration.
    pub fn new(config: &SimulationConfig) -> Result<Self, SimulationError> {
        let source = match config.time.utc_offset_hours {
            Some(hours) => SystemTimeSource::with_utc_offset(hours)
                .ok_or(SimulationError::InvalidUtcOffset { hours })?,
            None => SystemTimeSource::local(),
        };
        Self::with_time_source(config, Box::new(source))
    }

    /// Build a simulation from configuration with an explicit time source.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError`] if any component rejects its section of
    /// the configuration.
    pub fn with_time_source(
        config: &SimulationConfig,
        source: Box<dyn TimeSource>,
    ) -> Result<Self, SimulationError> {
        let mut clock = TimeClock::new(&config.time, source)?;
        if let Some(hour) = config.world.start_hour {
            clock = clock.with_start_hour(hour);
        }
        let weather = WeatherEngine::new(&config.weather, config.world.seed)?;
        let aggregator = EnvironmentAggregator::new(&config.sky)?;

        info!(
            seed = ?config.world.seed,
            hour = clock.hour(),
            weather = %weather.current().kind,
            "Simulation assembled"
        );

        Ok(Self::from_parts(clock, weather, aggregator))
    }

    /// Assemble a simulation from already-built components and publish the
    /// initial snapshot.
    pub fn from_parts(
        clock: TimeClock,
        weather: WeatherEngine,
        mut aggregator: EnvironmentAggregator,
    ) -> Self {
        aggregator.force_update(&clock, &weather);
        Self {
            clock,
            weather,
            aggregator,
            steps: 0,
        }
    }

    /// Advance every component by `delta_seconds` of frame time.
    pub fn step(&mut self, delta_seconds: f32) -> StepSummary {
        self.steps = self.steps.saturating_add(1);
        self.clock.advance(delta_seconds);
        self.weather.tick(delta_seconds);
        let published = self
            .aggregator
            .update(delta_seconds, &self.clock, &self.weather)
            .map(|snapshot| snapshot.sequence);

        let summary = StepSummary {
            step: self.steps,
            hour: self.clock.hour(),
            period: self.clock.current_period(),
            weather: self.weather.current().kind,
            transitioning: self.weather.is_transitioning(),
            published,
        };
        debug!(
            step = summary.step,
            hour = summary.hour,
            period = %summary.period,
            weather = %summary.weather,
            "Step complete"
        );
        summary
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Switch the clock's advance mode.
    pub fn set_mode(&mut self, mode: AdvanceMode) {
        self.clock.set_mode(mode);
    }

    /// Jump the clock to `hour`.
    pub fn set_time(&mut self, hour: f32) {
        self.clock.set_time(hour);
    }

    /// Jump the clock to `hour` and hold it there.
    pub fn hold_time(&mut self, hour: f32) {
        self.clock.hold_time(hour);
    }

    /// Request a weather change.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::UnknownCondition`] if `kind` is disabled.
    pub fn request_weather(&mut self, kind: WeatherType, instant: bool) -> Result<(), WeatherError> {
        self.weather.request_weather(kind, instant)
    }

    /// Request a weather change by name.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError`] if the name is unknown or the type disabled.
    pub fn request_weather_by_name(&mut self, name: &str, instant: bool) -> Result<(), WeatherError> {
        self.weather.request_weather_by_name(name, instant)
    }

    /// Force or release the rendered cloud coverage.
    pub fn set_cloud_coverage_override(&mut self, coverage: Option<f32>) {
        self.aggregator.set_cloud_coverage_override(coverage);
    }

    /// Publish a snapshot now, ignoring the aggregator's update interval.
    pub fn publish_now(&mut self) -> Arc<EnvironmentSnapshot> {
        self.aggregator.force_update(&self.clock, &self.weather)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The most recently published snapshot.
    pub fn current_snapshot(&self) -> Arc<EnvironmentSnapshot> {
        self.aggregator.current_snapshot()
    }

    /// A cloneable read handle for consumers on other threads.
    pub fn reader(&self) -> SnapshotReader {
        self.aggregator.reader()
    }

    /// Current period of the day.
    pub const fn current_period(&self) -> Period {
        self.clock.current_period()
    }

    /// Current hour as `h:MM AM/PM`.
    pub fn formatted_time(&self) -> String {
        self.clock.formatted_time()
    }

    /// Number of steps taken.
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// The time clock.
    pub const fn clock(&self) -> &TimeClock {
        &self.clock
    }

    /// Mutable access to the time clock, for subscriptions.
    pub const fn clock_mut(&mut self) -> &mut TimeClock {
        &mut self.clock
    }

    /// The weather engine.
    pub const fn weather(&self) -> &WeatherEngine {
        &self.weather
    }

    /// Mutable access to the weather engine, for subscriptions.
    pub const fn weather_mut(&mut self) -> &mut WeatherEngine {
        &mut self.weather
    }

    /// The environment aggregator.
    pub const fn aggregator(&self) -> &EnvironmentAggregator {
        &self.aggregator
    }

    /// Mutable access to the aggregator, for subscriptions.
    pub const fn aggregator_mut(&mut self) -> &mut EnvironmentAggregator {
        &mut self.aggregator
    }
}
