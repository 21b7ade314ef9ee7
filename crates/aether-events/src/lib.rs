//! Synchronous event dispatch for the Aether environment simulation.
//!
//! Components own an [`EventBus`] and emit events into it on the driving
//! thread. Subscribers are plain callbacks invoked in subscription order.
//! There is no queue: an emitted event has been fully delivered when
//! [`EventBus::emit`] returns.
//!
//! # Per-tick delivery
//!
//! A component opens a tick window with [`EventBus::begin_tick`] before
//! running its per-tick logic and closes it with [`EventBus::end_tick`].
//! Inside a window each event kind is delivered at most once; later events
//! of an already-delivered kind are dropped. Outside a window (command calls
//! between ticks) every event is delivered.
//!
//! # Modules
//!
//! - [`bus`] -- [`EventBus`], subscription handles, tick windows
//! - [`sink`] -- The [`EventSink`] subscriber trait and the [`Event`] trait
//! - [`recorder`] -- [`EventRecorder`], a sink that stores events for later
//!   inspection

pub mod bus;
pub mod recorder;
pub mod sink;

pub use bus::{EventBus, SubscriptionId};
pub use recorder::EventRecorder;
pub use sink::{Event, EventSink};
