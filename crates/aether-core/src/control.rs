//! Run control state shared between the step loop and its host.
//!
//! The host holds an `Arc<RunControl>` and can request a clean stop while
//! [`run_simulation`] is driving the loop. The step and wall-clock bounds
//! come from configuration. Pausing the simulated clock is an advance
//! mode ([`AdvanceMode::Paused`]), not a loop control.
//!
//! [`run_simulation`]: crate::runner::run_simulation
//! [`AdvanceMode::Paused`]: aether_types::AdvanceMode::Paused

use std::sync::atomic::{AtomicBool, Ordering};

use aether_types::{AdvanceMode, Period, WeatherType};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::SimulationBoundsConfig;
use crate::simulation::Simulation;

/// Reason the run loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
    /// The host requested a stop.
    StopRequested,
}

/// Shared run control state.
#[derive(Debug)]
pub struct RunControl {
    stop_requested: AtomicBool,
    /// Real-time milliseconds slept between steps.
    tick_interval_ms: u64,
    started_at: DateTime<Utc>,
    /// Maximum number of steps (0 = unlimited).
    max_ticks: u64,
    /// Maximum wall-clock seconds (0 = unlimited).
    max_real_time_seconds: u64,
    end_reason: Mutex<Option<SimulationEndReason>>,
}

impl RunControl {
    /// Create control state from the configured bounds.
    pub fn new(bounds: &SimulationBoundsConfig) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: bounds.tick_interval_ms,
            started_at: Utc::now(),
            max_ticks: bounds.max_ticks,
            max_real_time_seconds: bounds.max_real_time_seconds,
            end_reason: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop. The loop ends before its next step.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Record the reason the loop ended.
    pub fn set_end_reason(&self, reason: SimulationEndReason) {
        *self.end_reason.lock() = Some(reason);
    }

    /// The reason the loop ended, if it has.
    pub fn end_reason(&self) -> Option<SimulationEndReason> {
        *self.end_reason.lock()
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Real-time milliseconds slept between steps.
    pub const fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms
    }

    /// Whether `completed` steps reach the step limit.
    pub const fn tick_limit_reached(&self, completed: u64) -> bool {
        self.max_ticks > 0 && completed >= self.max_ticks
    }

    /// Whether the wall-clock limit has been reached.
    pub fn time_limit_reached(&self) -> bool {
        self.max_real_time_seconds > 0 && self.elapsed_seconds() >= self.max_real_time_seconds
    }

    /// Wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whole seconds elapsed since start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Configured step limit.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Configured wall-clock limit.
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.max_real_time_seconds
    }

    /// Serializable status combining control state and simulation state.
    pub fn status(&self, simulation: &Simulation) -> RunStatus {
        let snapshot = simulation.current_snapshot();
        RunStatus {
            steps: simulation.steps(),
            mode: simulation.clock().mode(),
            stop_requested: self.is_stop_requested(),
            tick_interval_ms: self.tick_interval_ms(),
            elapsed_seconds: self.elapsed_seconds(),
            time: simulation.formatted_time(),
            period: snapshot.period,
            weather: snapshot.weather,
            snapshot_sequence: snapshot.sequence,
            end_reason: self.end_reason(),
            started_at: self.started_at.to_rfc3339(),
        }
    }
}

/// JSON-serializable run status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    /// Steps executed.
    pub steps: u64,
    /// Advance mode of the simulated clock.
    pub mode: AdvanceMode,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// Step interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Wall-clock seconds since start.
    pub elapsed_seconds: u64,
    /// Simulated time of day, `h:MM AM/PM`.
    pub time: String,
    /// Period of the published snapshot.
    pub period: Period,
    /// Weather of the published snapshot.
    pub weather: WeatherType,
    /// Sequence of the published snapshot.
    pub snapshot_sequence: u64,
    /// Why the loop ended, if it has.
    pub end_reason: Option<SimulationEndReason>,
    /// RFC 3339 start timestamp.
    pub started_at: String,
}
