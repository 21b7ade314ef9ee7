//! Time clock, sky aggregation, and run loop for the Aether environment
//! simulation.
//!
//! This crate composes the time of day, the weather engine from
//! `aether-weather`, and the environment aggregator into one
//! [`Simulation`] that publishes a consistent [`EnvironmentSnapshot`] per
//! step.
//!
//! # Modules
//!
//! - [`aggregator`] -- Weather-modulated lighting, sky colors, and snapshot
//!   publication.
//! - [`clock`] -- Time of day, advance modes, periods, lighting curves.
//! - [`config`] -- Configuration loading from `aether-config.yaml` into
//!   strongly-typed structs.
//! - [`control`] -- Shared stop request and run bounds.
//! - [`curve`] -- Keyframe curves with wrap-around evaluation.
//! - [`palette`] -- Sky color tables over normalized time.
//! - [`runner`] -- The async step loop.
//! - [`simulation`] -- Fixed-order stepping of clock, weather, aggregator.
//! - [`snapshot`] -- Atomic snapshot publication for concurrent readers.
//! - [`time_source`] -- Wall-clock and manual [`TimeSource`]s.
//!
//! [`EnvironmentSnapshot`]: aether_types::EnvironmentSnapshot
//! [`TimeSource`]: time_source::TimeSource

pub mod aggregator;
pub mod clock;
pub mod config;
pub mod control;
pub mod curve;
pub mod palette;
pub mod runner;
pub mod simulation;
pub mod snapshot;
pub mod time_source;

pub use aggregator::{EnvironmentAggregator, EnvironmentInputs, SkyError};
pub use clock::{ClockError, PeriodBoundaries, TimeClock, TimeCurves};
pub use config::{ConfigError, SimulationConfig};
pub use control::{RunControl, RunStatus, SimulationEndReason};
pub use curve::{CurveError, Interpolation, Keyframe, KeyframeCurve};
pub use runner::{NoOpCallback, RunnerError, SimulationResult, StepCallback, run_simulation};
pub use simulation::{Simulation, SimulationError, StepSummary};
pub use snapshot::{SnapshotCell, SnapshotReader};
pub use time_source::{ManualTimeSource, SystemTimeSource, TimeSource};
