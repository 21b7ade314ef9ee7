//! Observer-list event bus with per-tick deduplication.

use std::collections::BTreeSet;
use std::fmt;

use tracing::trace;

use crate::sink::{Event, EventSink};

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// The raw numeric value of this handle.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Subscriber<E> {
    id: SubscriptionId,
    sink: Box<dyn EventSink<E>>,
}

/// Ordered list of subscribers for one event type.
pub struct EventBus<E: Event> {
    subscribers: Vec<Subscriber<E>>,
    next_id: u64,
    /// Kinds already delivered in the open tick window, if any.
    window: Option<BTreeSet<E::Kind>>,
}

impl<E: Event> EventBus<E> {
    /// Create a bus with no subscribers and no open tick window.
    pub const fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 0,
            window: None,
        }
    }

    /// Register a sink. Sinks are invoked in registration order.
    pub fn subscribe(&mut self, sink: impl EventSink<E> + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.subscribers.push(Subscriber {
            id,
            sink: Box::new(sink),
        });
        id
    }

    /// Remove a sink. Returns `false` if the handle was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|sub| sub.id != id);
        self.subscribers.len() != before
    }

    /// Number of registered sinks.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Open a tick window. Any window still open is discarded first.
    pub fn begin_tick(&mut self) {
        self.window = Some(BTreeSet::new());
    }

    /// Close the current tick window.
    pub fn end_tick(&mut self) {
        self.window = None;
    }

    /// Whether a tick window is currently open.
    pub const fn in_tick(&self) -> bool {
        self.window.is_some()
    }

    /// Deliver an event to every sink.
    ///
    /// Returns `false` if the event was dropped because its kind was already
    /// delivered in the open tick window.
    pub fn emit(&mut self, event: &E) -> bool {
        if let Some(delivered) = self.window.as_mut() {
            if !delivered.insert(event.kind()) {
                trace!(kind = ?event.kind(), "duplicate event kind in tick, dropped");
                return false;
            }
        }
        for sub in &mut self.subscribers {
            sub.sink.on_event(event);
        }
        true
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("in_tick", &self.window.is_some())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use aether_types::{ClockEvent, Period};
    use parking_lot::Mutex;

    use super::*;
    use crate::recorder::EventRecorder;

    #[test]
    fn delivers_to_all_subscribers_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut bus: EventBus<ClockEvent> = EventBus::new();
        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.subscribe(move |_: &ClockEvent| order.lock().push(tag));
        }

        assert!(bus.emit(&ClockEvent::Sunrise));
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let recorder = EventRecorder::new();
        let mut bus: EventBus<ClockEvent> = EventBus::new();
        let id = bus.subscribe(recorder.sink());

        bus.emit(&ClockEvent::Sunrise);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&ClockEvent::Sunset);

        assert_eq!(recorder.events(), vec![ClockEvent::Sunrise]);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn tick_window_delivers_each_kind_once() {
        let recorder = EventRecorder::new();
        let mut bus: EventBus<ClockEvent> = EventBus::new();
        bus.subscribe(recorder.sink());

        bus.begin_tick();
        assert!(bus.emit(&ClockEvent::TimeChanged { hour: 1.0 }));
        assert!(!bus.emit(&ClockEvent::TimeChanged { hour: 2.0 }));
        assert!(bus.emit(&ClockEvent::PeriodChanged {
            from: Period::Night,
            to: Period::Dawn,
        }));
        bus.end_tick();

        assert_eq!(recorder.len(), 2);
        assert_eq!(
            recorder.events().first(),
            Some(&ClockEvent::TimeChanged { hour: 1.0 })
        );
    }

    #[test]
    fn outside_window_every_event_is_delivered() {
        let recorder = EventRecorder::new();
        let mut bus: EventBus<ClockEvent> = EventBus::new();
        bus.subscribe(recorder.sink());

        assert!(!bus.in_tick());
        assert!(bus.emit(&ClockEvent::Sunrise));
        assert!(bus.emit(&ClockEvent::Sunrise));
        assert_eq!(recorder.len(), 2);
    }

    #[test]
    fn new_window_resets_delivered_kinds() {
        let recorder = EventRecorder::new();
        let mut bus: EventBus<ClockEvent> = EventBus::new();
        bus.subscribe(recorder.sink());

        bus.begin_tick();
        bus.emit(&ClockEvent::Sunset);
        bus.end_tick();
        bus.begin_tick();
        bus.emit(&ClockEvent::Sunset);
        bus.end_tick();

        assert_eq!(recorder.len(), 2);
    }
}
