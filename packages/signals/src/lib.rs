//! Push-based event streams with multicast delivery.
//!
//! A [`Signal`] represents values (or a failure) arriving over time. A
//! producer pushes [`Event`]s through a [`Sink`]; the signal fans each event
//! out to every registered [`Observer`] in subscription order; each
//! subscription yields a [`disposables::AnyDisposable`] that cancels future
//! delivery to that observer, from any thread, at any moment.
//!
//! A signal terminates at most once - with [`Event::Failed`],
//! [`Event::Completed`] or [`Event::Interrupted`] - and a terminal event is
//! always the last thing any observer receives. Pushes after termination are
//! silently ignored.
//!
//! [`Signal`] is hot: its generator runs exactly once and all observers share
//! the one event stream. [`SignalProducer`] is the cold counterpart: every
//! [`start`][SignalProducer::start] runs the generator afresh for that one
//! observer.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use signals::{Event, Observer, Signal};
//!
//! let (sink, signal) = Signal::<i32, String>::pipe();
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink_side = Arc::clone(&seen);
//!
//! let subscription = signal.observe(Observer::new(move |event| {
//!     if let Event::Value(value) = event {
//!         sink_side.lock().unwrap().push(value);
//!     }
//! }));
//!
//! sink.send_value(1);
//! sink.send_value(2);
//! sink.send_completed();
//!
//! assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
//! # drop(subscription);
//! ```

mod event;
mod observer;
mod producer;
mod signal;

pub use event::*;
pub use observer::*;
pub use producer::*;
pub use signal::*;

// A poisoned lock means an observer callback panicked mid-delivery; the
// stream's delivery state is no longer trustworthy.
pub(crate) const ERR_POISONED_LOCK: &str =
    "encountered poisoned lock - an observer panicked and delivery state is unknown";
