//! A sink that keeps every event it receives.
//!
//! Used by tests and by hosts that want to drain events after a step rather
//! than react inside the callback.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::sink::EventSink;

/// Shared, cloneable store of received events.
#[derive(Debug)]
pub struct EventRecorder<E> {
    events: Arc<Mutex<Vec<E>>>,
}

impl<E> Clone for EventRecorder<E> {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
        }
    }
}

impl<E> Default for EventRecorder<E> {
    fn default() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<E: Clone + Send + 'static> EventRecorder<E> {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that appends to this recorder.
    pub fn sink(&self) -> impl EventSink<E> + 'static {
        let events = Arc::clone(&self.events);
        move |event: &E| events.lock().push(event.clone())
    }

    /// Copy of every event received so far, oldest first.
    pub fn events(&self) -> Vec<E> {
        self.events.lock().clone()
    }

    /// Remove and return every event received so far.
    pub fn take(&self) -> Vec<E> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Number of events received so far.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether no event has been received.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Number of received events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&E) -> bool) -> usize {
        self.events.lock().iter().filter(|event| predicate(event)).count()
    }
}
