//! Subscriber trait and event classification.

use std::fmt::Debug;

use aether_types::{
    ClockEvent, ClockEventKind, EnvironmentEvent, EnvironmentEventKind, WeatherEvent,
    WeatherEventKind,
};

/// An event that can be dispatched through an [`EventBus`].
///
/// [`EventBus`]: crate::EventBus
pub trait Event: Debug {
    /// Payload-free discriminant used for per-tick deduplication.
    type Kind: Copy + Ord + Debug;

    /// Return the discriminant of this event.
    fn kind(&self) -> Self::Kind;
}

impl Event for ClockEvent {
    type Kind = ClockEventKind;

    fn kind(&self) -> Self::Kind {
        Self::kind(self)
    }
}

impl Event for WeatherEvent {
    type Kind = WeatherEventKind;

    fn kind(&self) -> Self::Kind {
        Self::kind(self)
    }
}

impl Event for EnvironmentEvent {
    type Kind = EnvironmentEventKind;

    fn kind(&self) -> Self::Kind {
        Self::kind(self)
    }
}

/// Receiver of events from an [`EventBus`].
///
/// Any `FnMut(&E) + Send` closure is a sink.
///
/// [`EventBus`]: crate::EventBus
pub trait EventSink<E>: Send {
    /// Called synchronously on the driving thread for each delivered event.
    fn on_event(&mut self, event: &E);
}

impl<E, F> EventSink<E> for F
where
    F: FnMut(&E) + Send,
{
    fn on_event(&mut self, event: &E) {
        self(event);
    }
}
