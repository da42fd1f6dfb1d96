use std::time::{Duration, Instant};

use disposables::AnyDisposable;

/// A zero-argument action submitted to a scheduler.
pub type Action = Box<dyn FnOnce() + Send>;

/// A repeating action; the scheduler invokes it once per occurrence.
pub type RecurringAction = Box<dyn FnMut() + Send>;

/// Determines the execution context in which submitted actions run.
///
/// Implementations are safe to call from any thread. The core owns no
/// implicit thread pool; whatever concurrency a scheduler provides is
/// established when the scheduler is constructed.
pub trait Scheduler: Send + Sync {
    /// Submits `action` for execution as soon as the scheduler's contract
    /// allows.
    ///
    /// Returns a disposable that suppresses the action if disposed before it
    /// runs, or [`None`] if the action has already completed by the time the
    /// call returns (cancellation would be meaningless).
    fn schedule(&self, action: Action) -> Option<AnyDisposable>;
}

/// A scheduler with a clock: actions can be scheduled for future dates and
/// at repeating intervals.
///
/// The scheduler's notion of "now" comes from [`now`][Self::now], not from
/// the system clock, which is what allows a virtual-time implementation to
/// substitute a manually advanced clock in tests.
pub trait DateScheduler: Scheduler {
    /// The scheduler's current date.
    fn now(&self) -> Instant;

    /// Submits `action` to run at `date` (or as soon after as the scheduler's
    /// contract allows).
    ///
    /// Returns a disposable that suppresses the action if disposed before it
    /// runs.
    fn schedule_at(&self, date: Instant, action: Action) -> AnyDisposable;

    /// Submits `action` to run `delay` from the scheduler's current date.
    fn schedule_after(&self, delay: Duration, action: Action) -> AnyDisposable {
        self.schedule_at(self.now() + delay, action)
    }

    /// Submits `action` to run at `first` and then repeatedly every
    /// `interval`.
    ///
    /// `leeway` is a tolerance hint: the scheduler may fire an occurrence up
    /// to that much early or late to coalesce wakeups. Disposing the returned
    /// disposable stops all future occurrences, including any already queued.
    fn schedule_recurring(
        &self,
        first: Instant,
        interval: Duration,
        leeway: Duration,
        action: RecurringAction,
    ) -> AnyDisposable;
}
