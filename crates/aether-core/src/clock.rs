//! Time of day, advance modes, and lighting curves.
//!
//! The clock is the single authority over the hour of day. It owns the
//! advance mode, classifies the hour into a [`Period`], and evaluates the
//! lighting curves that translate the hour into visual quantities. Nothing
//! else in the simulation reinterprets the raw hour.
//!
//! # Design Principles
//!
//! - The hour is always in `[0, 24)`. Out-of-range inputs wrap, they are
//!   never rejected.
//! - The period is recomputed from the hour on every change and is never
//!   set independently.
//! - Throttling only changes how often the clock recomputes. Deltas below
//!   the minimum update interval accumulate and are applied later, so
//!   accelerated time loses nothing.
//!
//! # Events
//!
//! | Event           | Fired when                                        |
//! |-----------------|---------------------------------------------------|
//! | `PeriodChanged` | the recomputed period differs from the last one   |
//! | `Sunrise`       | the clock enters the day period                   |
//! | `Sunset`        | the clock leaves the day period                   |
//! | `TimeChanged`   | the hour changed                                  |
//!
//! Within one [`TimeClock::advance`] call events fire in that order and
//! each kind at most once.

use aether_events::{EventBus, EventSink, SubscriptionId};
use aether_types::{AdvanceMode, ClockEvent, HOURS_PER_DAY, Period, TimeLighting};
use glam::Vec3;
use tracing::{debug, info};

use crate::config::{TimeConfig, TimeCurveConfig};
use crate::curve::{CurveError, Keyframe, KeyframeCurve};
use crate::time_source::TimeSource;

/// Errors that can occur when building a clock.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClockError {
    /// Invalid time configuration (e.g. unordered period boundaries).
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },

    /// A lighting curve failed validation.
    #[error("invalid {name} curve: {source}")]
    Curve {
        /// Which curve was rejected.
        name: &'static str,
        /// The underlying curve error.
        source: CurveError,
    },
}

/// Wrap any hour into `[0, 24)`. Non-finite input becomes midnight.
pub fn wrap_hour(hour: f32) -> f32 {
    if !hour.is_finite() {
        return 0.0;
    }
    let wrapped = hour.rem_euclid(HOURS_PER_DAY);
    // rem_euclid can round up to exactly 24 for tiny negative inputs.
    if wrapped >= HOURS_PER_DAY { 0.0 } else { wrapped }
}

/// Format an hour as a 12-hour clock string, e.g. `"5:07 PM"`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_hour(hour: f32) -> String {
    let minutes_total = (wrap_hour(hour) * 60.0).floor().clamp(0.0, 1439.0) as u32;
    let hours = minutes_total / 60;
    let minutes = minutes_total % 60;
    let (display, suffix) = match hours {
        0 => (12, "AM"),
        1..=11 => (hours, "AM"),
        12 => (12, "PM"),
        _ => (hours.saturating_sub(12), "PM"),
    };
    format!("{display}:{minutes:02} {suffix}")
}

// ---------------------------------------------------------------------------
// Period boundaries
// ---------------------------------------------------------------------------

/// The four boundary hours that partition the day into periods.
///
/// `[dawn_start, dawn_end)` is dawn, `[dawn_end, dusk_start)` is day,
/// `[dusk_start, dusk_end)` is dusk, and the rest, wrapping through
/// midnight, is night.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodBoundaries {
    dawn_start: f32,
    dawn_end: f32,
    dusk_start: f32,
    dusk_end: f32,
}

impl PeriodBoundaries {
    /// Validate and build a boundary set.
    ///
    /// Requires `0 <= dawn_start < dawn_end < dusk_start < dusk_end <= 24`
    /// with a non-empty night.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the hours are out of order,
    /// out of range, or not finite.
    pub fn new(
        dawn_start: f32,
        dawn_end: f32,
        dusk_start: f32,
        dusk_end: f32,
    ) -> Result<Self, ClockError> {
        let hours = [dawn_start, dawn_end, dusk_start, dusk_end];
        let ordered = hours.iter().all(|h| h.is_finite())
            && dawn_start >= 0.0
            && dawn_start < dawn_end
            && dawn_end < dusk_start
            && dusk_start < dusk_end
            && dusk_end <= HOURS_PER_DAY
            && (dawn_start > 0.0 || dusk_end < HOURS_PER_DAY);
        if !ordered {
            return Err(ClockError::InvalidConfig {
                reason: format!(
                    "period boundaries must satisfy 0 <= dawn_start < dawn_end < dusk_start < \
                     dusk_end <= 24 with a non-empty night, got {hours:?}"
                ),
            });
        }
        Ok(Self {
            dawn_start,
            dawn_end,
            dusk_start,
            dusk_end,
        })
    }

    /// Classify an hour. Input is wrapped first.
    pub fn period_at(&self, hour: f32) -> Period {
        let hour = wrap_hour(hour);
        if hour >= self.dawn_start && hour < self.dawn_end {
            Period::Dawn
        } else if hour >= self.dawn_end && hour < self.dusk_start {
            Period::Day
        } else if hour >= self.dusk_start && hour < self.dusk_end {
            Period::Dusk
        } else {
            Period::Night
        }
    }

    /// Hour the dawn period begins.
    pub const fn dawn_start(&self) -> f32 {
        self.dawn_start
    }

    /// Hour the day begins.
    pub const fn dawn_end(&self) -> f32 {
        self.dawn_end
    }

    /// Hour the day ends.
    pub const fn dusk_start(&self) -> f32 {
        self.dusk_start
    }

    /// Hour the night begins.
    pub const fn dusk_end(&self) -> f32 {
        self.dusk_end
    }
}

impl Default for PeriodBoundaries {
    fn default() -> Self {
        Self {
            dawn_start: 5.0,
            dawn_end: 7.0,
            dusk_start: 17.0,
            dusk_end: 19.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Lighting curves
// ---------------------------------------------------------------------------

/// The clock's lighting curves, keyed by hour.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeCurves {
    /// Directional sun intensity.
    pub sun_intensity: KeyframeCurve<f32>,
    /// Moon intensity.
    pub moon_intensity: KeyframeCurve<f32>,
    /// Ambient light color.
    pub ambient_color: KeyframeCurve<Vec3>,
    /// Base fog density.
    pub fog_density: KeyframeCurve<f32>,
    /// Star visibility alpha.
    pub star_visibility: KeyframeCurve<f32>,
}

impl TimeCurves {
    /// Validate and build every curve from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Curve`] naming the first invalid table.
    pub fn from_config(config: &TimeCurveConfig) -> Result<Self, ClockError> {
        let mode = config.interpolation;
        let scalar = |name: &'static str, keys: &[Keyframe<f32>]| {
            KeyframeCurve::new(keys.to_vec(), HOURS_PER_DAY, mode)
                .map_err(|source| ClockError::Curve { name, source })
        };
        Ok(Self {
            sun_intensity: scalar("sun_intensity", &config.sun_intensity)?,
            moon_intensity: scalar("moon_intensity", &config.moon_intensity)?,
            ambient_color: KeyframeCurve::new(config.ambient_color.clone(), HOURS_PER_DAY, mode)
                .map_err(|source| ClockError::Curve {
                    name: "ambient_color",
                    source,
                })?,
            fog_density: scalar("fog_density", &config.fog_density)?,
            star_visibility: scalar("star_visibility", &config.star_visibility)?,
        })
    }

    /// Evaluate every curve at `hour`.
    pub fn evaluate(&self, hour: f32) -> TimeLighting {
        TimeLighting {
            sun_intensity: self.sun_intensity.evaluate(hour).max(0.0),
            moon_intensity: self.moon_intensity.evaluate(hour).max(0.0),
            ambient_color: self.ambient_color.evaluate(hour).max(Vec3::ZERO),
            fog_density: self.fog_density.evaluate(hour).max(0.0),
            star_visibility: self.star_visibility.evaluate(hour).clamp(0.0, 1.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Authoritative time of day.
#[derive(Debug)]
pub struct TimeClock {
    /// Authoritative hour; `hour` is derived from it.
    precise_hour: f64,
    hour: f32,
    period: Period,
    mode: AdvanceMode,
    /// Mode restored when a manual override is released.
    resume_mode: AdvanceMode,
    override_hour: f32,

    boundaries: PeriodBoundaries,
    curves: TimeCurves,
    /// Simulated hours per real second at `time_scale` 1.
    hours_per_second: f64,
    time_scale: f32,
    min_update_interval: f32,
    /// Delta accumulated since the last recompute.
    pending_delta: f64,
    day_count: u64,

    source: Box<dyn TimeSource>,
    events: EventBus<ClockEvent>,
}

impl TimeClock {
    /// Create a clock from configuration.
    ///
    /// The clock starts at the wall-clock hour reported by `source`; use
    /// [`TimeClock::with_start_hour`] to seed a fixed hour instead.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] for bad boundaries, day length,
    /// time scale, or update interval, and [`ClockError::Curve`] for an
    /// invalid lighting curve.
    pub fn new(config: &TimeConfig, source: Box<dyn TimeSource>) -> Result<Self, ClockError> {
        let boundaries = PeriodBoundaries::new(
            config.dawn_start,
            config.dawn_end,
            config.dusk_start,
            config.dusk_end,
        )?;
        if !config.day_length_seconds.is_finite() || config.day_length_seconds <= 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!(
                    "day_length_seconds must be positive, got {}",
                    config.day_length_seconds
                ),
            });
        }
        if !config.time_scale.is_finite() || config.time_scale < 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!("time_scale must be >= 0, got {}", config.time_scale),
            });
        }
        if !config.min_update_interval_seconds.is_finite()
            || config.min_update_interval_seconds < 0.0
        {
            return Err(ClockError::InvalidConfig {
                reason: format!(
                    "min_update_interval_seconds must be >= 0, got {}",
                    config.min_update_interval_seconds
                ),
            });
        }
        let curves = TimeCurves::from_config(&config.curves)?;

        let hour = wrap_hour(source.hour_of_day());
        let resume_mode = if config.mode == AdvanceMode::ManualOverride {
            AdvanceMode::default()
        } else {
            config.mode
        };

        info!(
            hour,
            mode = ?config.mode,
            day_length_seconds = config.day_length_seconds,
            time_scale = config.time_scale,
            "Time clock initialized"
        );

        Ok(Self {
            precise_hour: f64::from(hour),
            hour,
            period: boundaries.period_at(hour),
            mode: config.mode,
            resume_mode,
            override_hour: hour,
            boundaries,
            curves,
            hours_per_second: f64::from(HOURS_PER_DAY) / f64::from(config.day_length_seconds),
            time_scale: config.time_scale,
            min_update_interval: config.min_update_interval_seconds,
            pending_delta: 0.0,
            day_count: 0,
            source,
            events: EventBus::new(),
        })
    }

    /// Seed the starting hour without firing events.
    #[must_use]
    pub fn with_start_hour(mut self, hour: f32) -> Self {
        self.hour = wrap_hour(hour);
        self.precise_hour = f64::from(self.hour);
        self.period = self.boundaries.period_at(self.hour);
        self.override_hour = self.hour;
        self
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Switch the advance strategy. Takes effect immediately and keeps the
    /// current hour.
    ///
    /// Entering [`AdvanceMode::ManualOverride`] holds the current hour and
    /// remembers the previous mode for [`TimeClock::set_time`] to restore.
    pub fn set_mode(&mut self, mode: AdvanceMode) {
        if mode == self.mode {
            return;
        }
        if mode == AdvanceMode::ManualOverride {
            self.resume_mode = self.mode;
            self.override_hour = self.hour;
        }
        info!(from = ?self.mode, to = ?mode, hour = self.hour, "Advance mode changed");
        self.mode = mode;
        self.pending_delta = 0.0;
    }

    /// Jump to `hour`, wrapped into `[0, 24)`.
    ///
    /// Applies immediately and fires events for the jump. A manual override
    /// is released back to the mode that was active before it; use
    /// [`TimeClock::hold_time`] to pin the hour instead.
    pub fn set_time(&mut self, hour: f32) {
        let hour = wrap_hour(hour);
        if self.mode == AdvanceMode::ManualOverride {
            self.set_mode(self.resume_mode);
        }
        info!(hour, "Time set");
        self.apply_hour(f64::from(hour));
    }

    /// Jump to `hour` and hold it there in [`AdvanceMode::ManualOverride`].
    pub fn hold_time(&mut self, hour: f32) {
        let hour = wrap_hour(hour);
        self.set_mode(AdvanceMode::ManualOverride);
        self.override_hour = hour;
        info!(hour, "Time held");
        self.apply_hour(f64::from(hour));
    }

    /// Register a sink for clock events.
    pub fn subscribe(&mut self, sink: impl EventSink<ClockEvent> + 'static) -> SubscriptionId {
        self.events.subscribe(sink)
    }

    /// Remove a previously registered sink.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance by `delta_seconds` of frame time.
    ///
    /// Deltas accumulate until they reach the minimum update interval; only
    /// then is the hour recomputed. Returns whether a recompute happened.
    /// Non-finite or negative deltas count as zero.
    pub fn advance(&mut self, delta_seconds: f32) -> bool {
        if delta_seconds.is_finite() && delta_seconds > 0.0 {
            self.pending_delta += f64::from(delta_seconds);
        }
        if self.pending_delta < f64::from(self.min_update_interval) {
            return false;
        }
        let delta = std::mem::take(&mut self.pending_delta);

        let next = match self.mode {
            AdvanceMode::RealTimeSync => f64::from(wrap_hour(self.source.hour_of_day())),
            AdvanceMode::AcceleratedSimulation => self.integrate(delta),
            AdvanceMode::ManualOverride => f64::from(self.override_hour),
            AdvanceMode::Paused => self.precise_hour,
        };

        self.events.begin_tick();
        self.apply_hour(next);
        self.events.end_tick();
        true
    }

    /// Integrate `delta` seconds of accelerated time and count day wraps.
    ///
    /// Accumulates in `f64`. The result is independent of how the deltas
    /// were batched.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn integrate(&mut self, delta: f64) -> f64 {
        let day = f64::from(HOURS_PER_DAY);
        let raw = self.precise_hour + delta * self.hours_per_second * f64::from(self.time_scale);
        let wraps = (raw / day).floor();
        if wraps >= 1.0 {
            self.day_count = self.day_count.saturating_add(wraps.min(1e15) as u64);
            debug!(day_count = self.day_count, "Day completed");
        }
        raw.rem_euclid(day)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn apply_hour(&mut self, precise_hour: f64) {
        let previous_hour = self.hour;
        let previous_period = self.period;
        let hour = wrap_hour(precise_hour as f32);
        self.precise_hour = precise_hour;
        self.hour = hour;
        self.period = self.boundaries.period_at(hour);

        if self.period != previous_period {
            debug!(from = %previous_period, to = %self.period, hour, "Period changed");
            self.events.emit(&ClockEvent::PeriodChanged {
                from: previous_period,
                to: self.period,
            });
            if self.period == Period::Day {
                self.events.emit(&ClockEvent::Sunrise);
            } else if previous_period == Period::Day {
                self.events.emit(&ClockEvent::Sunset);
            }
        }
        if (hour - previous_hour).abs() > 0.0 {
            self.events.emit(&ClockEvent::TimeChanged { hour });
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Current hour, `[0, 24)`.
    pub const fn hour(&self) -> f32 {
        self.hour
    }

    /// Current hour divided by 24, `[0, 1)`.
    pub fn normalized(&self) -> f32 {
        self.hour / HOURS_PER_DAY
    }

    /// Current day period.
    pub const fn current_period(&self) -> Period {
        self.period
    }

    /// Whether the current period is day. False at dawn and dusk.
    pub const fn is_day(&self) -> bool {
        matches!(self.period, Period::Day)
    }

    /// Whether the current period is night. False at dawn and dusk.
    pub const fn is_night(&self) -> bool {
        matches!(self.period, Period::Night)
    }

    /// The current hour as a 12-hour clock string.
    pub fn formatted_time(&self) -> String {
        format_hour(self.hour)
    }

    /// Active advance mode.
    pub const fn mode(&self) -> AdvanceMode {
        self.mode
    }

    /// Number of midnights passed in accelerated simulation.
    pub const fn day_count(&self) -> u64 {
        self.day_count
    }

    /// Lighting quantities for the current hour.
    pub fn lighting(&self) -> TimeLighting {
        self.curves.evaluate(self.hour)
    }

    /// The period partition in use.
    pub const fn boundaries(&self) -> &PeriodBoundaries {
        &self.boundaries
    }

    /// The lighting curves in use.
    pub const fn curves(&self) -> &TimeCurves {
        &self.curves
    }
}
