//! Execution-context abstractions: where and when does an action run.
//!
//! A [`Scheduler`] accepts zero-argument actions; a [`DateScheduler`] also
//! understands future dates and repeating intervals, and exposes its own
//! notion of "now" so tests can substitute a virtual clock. Every variant
//! returns a [`disposables::AnyDisposable`] (where cancellation is
//! meaningful) that suppresses an action that has not yet run.
//!
//! Variants:
//!
//! - [`ImmediateScheduler`] - runs the action synchronously on the calling
//!   thread.
//! - [`CoalescingScheduler`] - funnels actions onto one designated thread,
//!   running inline when called on that thread with nothing pending.
//! - [`QueueScheduler`] - a named worker thread executing actions
//!   one-at-a-time in submission order, with future-dated and repeating
//!   scheduling.
//! - [`TestScheduler`] - a deterministic virtual-time scheduler for tests.
//!
//! None of the variants owns an implicit thread pool; each scheduler's
//! threading is explicit and supplied at construction.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use schedulers::{DateScheduler, Scheduler, TestScheduler};
//!
//! let scheduler = TestScheduler::new();
//!
//! scheduler.schedule_after(Duration::from_secs(5), Box::new(|| println!("later")));
//! scheduler.advance_by(Duration::from_secs(5)); // prints "later"
//! ```

mod coalescing;
mod immediate;
mod job;
mod queue;
mod scheduler;
mod test_scheduler;

pub use coalescing::*;
pub use immediate::*;
pub use queue::*;
pub use scheduler::*;
pub use test_scheduler::*;

// A poisoned lock means a scheduled action panicked while the queue state was
// mid-mutation; the pending work set is no longer trustworthy.
pub(crate) const ERR_POISONED_LOCK: &str =
    "encountered poisoned lock - the pending action queue is in an unknown state";

/// Returns a scheduler that runs actions synchronously on the calling thread.
#[must_use]
pub fn immediate() -> ImmediateScheduler {
    ImmediateScheduler
}

/// Returns a scheduler that coalesces actions onto its own designated thread.
#[must_use]
pub fn coalescing() -> CoalescingScheduler {
    CoalescingScheduler::new()
}

/// Returns a serial scheduler backed by a dedicated worker thread with the
/// given name.
#[must_use]
pub fn queue(name: &str) -> QueueScheduler {
    QueueScheduler::new(name)
}
