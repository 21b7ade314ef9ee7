//! Events broadcast by the simulation components.
//!
//! Each event enum has a companion `*Kind` enum naming its variant without
//! payload. The event bus uses the kind to enforce at-most-once delivery of
//! a given event type per tick.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::enums::Period;
use crate::structs::{EnvironmentSnapshot, WeatherCondition};

/// Events emitted by the time clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClockEvent {
    /// The hour changed.
    TimeChanged {
        /// The new hour, `[0, 24)`.
        hour: f32,
    },
    /// The day period changed.
    PeriodChanged {
        /// Period before the change.
        from: Period,
        /// Period after the change.
        to: Period,
    },
    /// The clock entered the day period.
    Sunrise,
    /// The clock left the day period.
    Sunset,
}

/// Payload-free discriminant of [`ClockEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClockEventKind {
    /// [`ClockEvent::TimeChanged`].
    TimeChanged,
    /// [`ClockEvent::PeriodChanged`].
    PeriodChanged,
    /// [`ClockEvent::Sunrise`].
    Sunrise,
    /// [`ClockEvent::Sunset`].
    Sunset,
}

impl ClockEvent {
    /// The payload-free discriminant of this event.
    pub const fn kind(&self) -> ClockEventKind {
        match self {
            Self::TimeChanged { .. } => ClockEventKind::TimeChanged,
            Self::PeriodChanged { .. } => ClockEventKind::PeriodChanged,
            Self::Sunrise => ClockEventKind::Sunrise,
            Self::Sunset => ClockEventKind::Sunset,
        }
    }
}

/// Events emitted by the weather engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WeatherEvent {
    /// The weather settled on a new condition.
    WeatherChanged {
        /// The condition now in effect.
        condition: WeatherCondition,
    },
    /// A timed transition toward a new condition began.
    TransitionStarted {
        /// The condition the transition starts from.
        previous: WeatherCondition,
        /// The condition the transition ends on.
        target: WeatherCondition,
    },
    /// A lightning flash started.
    LightningStrike {
        /// Peak intensity of the flash sequence.
        peak_intensity: f32,
    },
    /// The delayed thunder cue for an earlier strike is due.
    Thunder {
        /// Seconds elapsed between the flash and this cue.
        delay_seconds: f32,
    },
}

/// Payload-free discriminant of [`WeatherEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WeatherEventKind {
    /// [`WeatherEvent::WeatherChanged`].
    WeatherChanged,
    /// [`WeatherEvent::TransitionStarted`].
    TransitionStarted,
    /// [`WeatherEvent::LightningStrike`].
    LightningStrike,
    /// [`WeatherEvent::Thunder`].
    Thunder,
}

impl WeatherEvent {
    /// The payload-free discriminant of this event.
    pub const fn kind(&self) -> WeatherEventKind {
        match self {
            Self::WeatherChanged { .. } => WeatherEventKind::WeatherChanged,
            Self::TransitionStarted { .. } => WeatherEventKind::TransitionStarted,
            Self::LightningStrike { .. } => WeatherEventKind::LightningStrike,
            Self::Thunder { .. } => WeatherEventKind::Thunder,
        }
    }
}

/// Events emitted by the environment aggregator.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentEvent {
    /// A new snapshot was published.
    Updated(Arc<EnvironmentSnapshot>),
}

/// Payload-free discriminant of [`EnvironmentEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnvironmentEventKind {
    /// [`EnvironmentEvent::Updated`].
    Updated,
}

impl EnvironmentEvent {
    /// The payload-free discriminant of this event.
    pub const fn kind(&self) -> EnvironmentEventKind {
        match self {
            Self::Updated(_) => EnvironmentEventKind::Updated,
        }
    }
}
