use disposables::AnyDisposable;

use crate::{Action, Scheduler};

/// Runs every action synchronously on the calling thread, before
/// [`schedule`][Scheduler::schedule] returns.
///
/// Because the action has always completed by the time `schedule` returns,
/// there is nothing to cancel and `schedule` yields no disposable.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// use schedulers::{ImmediateScheduler, Scheduler};
///
/// let ran = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&ran);
///
/// ImmediateScheduler.schedule(Box::new(move || flag.store(true, Ordering::SeqCst)));
///
/// assert!(ran.load(Ordering::SeqCst));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn schedule(&self, action: Action) -> Option<AnyDisposable> {
        action();
        None
    }
}
