use std::collections::BinaryHeap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use disposables::{AnyDisposable, Disposable};

use crate::job::{Job, Work};
use crate::{Action, DateScheduler, ERR_POISONED_LOCK, RecurringAction, Scheduler};

/// A deterministic virtual-time scheduler for tests.
///
/// The scheduler holds a monotonic virtual clock that only moves when the
/// test advances it. Submitted actions are queued at their virtual dates and
/// executed - in ascending date order, ties resolved by submission order -
/// when the clock passes them. Repeating actions reschedule themselves at
/// `date + interval` after every run; disposing the returned disposable
/// stops every future occurrence, including one already queued.
///
/// Leeway hints are ignored: virtual time is exact by design.
///
/// # Example
///
/// ```rust
/// use std::sync::mpsc::channel;
/// use std::time::Duration;
///
/// use schedulers::{DateScheduler, TestScheduler};
///
/// let scheduler = TestScheduler::new();
/// let (tx, rx) = channel();
///
/// scheduler.schedule_after(
///     Duration::from_secs(60),
///     Box::new(move || {
///         tx.send("one virtual minute later").unwrap();
///     }),
/// );
///
/// assert!(rx.try_recv().is_err());
///
/// scheduler.advance_by(Duration::from_secs(60));
/// assert_eq!(rx.try_recv().unwrap(), "one virtual minute later");
/// ```
#[derive(Clone)]
pub struct TestScheduler {
    core: Arc<Core>,
}

struct Core {
    state: Mutex<State>,
}

struct State {
    /// The virtual "now". Starts at the construction instant and only moves
    /// forward, via the `advance*` family.
    now: Instant,

    next_seq: u64,

    jobs: BinaryHeap<Job>,
}

impl TestScheduler {
    /// Creates a scheduler whose virtual clock starts at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: Arc::new(Core {
                state: Mutex::new(State {
                    now: Instant::now(),
                    next_seq: 0,
                    jobs: BinaryHeap::new(),
                }),
            }),
        }
    }

    fn enqueue(&self, date: Instant, work: Work) -> AnyDisposable {
        let cancel = AnyDisposable::empty();

        let mut state = self.core.state.lock().expect(ERR_POISONED_LOCK);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.jobs.push(Job {
            date,
            seq,
            work,
            cancel: cancel.clone(),
        });

        cancel
    }

    /// Advances the virtual clock by one nanosecond, executing anything that
    /// becomes due.
    pub fn advance(&self) {
        self.advance_by(Duration::from_nanos(1));
    }

    /// Advances the virtual clock by `interval`, executing everything that
    /// becomes due along the way.
    pub fn advance_by(&self, interval: Duration) {
        let target = self.now() + interval;
        self.advance_to(target);
    }

    /// Advances the virtual clock to `target`, executing, in ascending date
    /// order, every pending action whose date is at or before `target`.
    ///
    /// The clock visits each executed action's date on the way, so an action
    /// observing [`now`][DateScheduler::now] sees its own scheduled date.
    /// Advancing to a date in the past is a no-op.
    pub fn advance_to(&self, target: Instant) {
        loop {
            let mut state = self.core.state.lock().expect(ERR_POISONED_LOCK);

            let due = state.jobs.peek().is_some_and(|job| job.date <= target);
            if !due {
                if target > state.now {
                    state.now = target;
                }
                return;
            }

            let job = state
                .jobs
                .pop()
                .expect("peeked job disappeared while the lock was held");

            if job.date > state.now {
                state.now = job.date;
            }

            // The lock is released around the action: actions routinely
            // schedule follow-up work on this same scheduler.
            drop(state);

            match job.work {
                Work::Once(action) => {
                    if !job.cancel.is_disposed() {
                        action();
                    }
                }
                Work::Recurring {
                    interval,
                    leeway,
                    mut action,
                } => {
                    if job.cancel.is_disposed() {
                        continue;
                    }

                    action();

                    if job.cancel.is_disposed() {
                        continue;
                    }

                    let mut state = self.core.state.lock().expect(ERR_POISONED_LOCK);
                    let seq = state.next_seq;
                    state.next_seq += 1;
                    state.jobs.push(Job {
                        date: job.date + interval,
                        seq,
                        work: Work::Recurring {
                            interval,
                            leeway,
                            action,
                        },
                        cancel: job.cancel,
                    });
                }
            }
        }
    }

    /// Executes every pending action, bounded by the latest date that was
    /// pending when the call was made.
    ///
    /// Repeating actions keep firing while their occurrences fall within
    /// that horizon; the first occurrence past it stays queued, which is what
    /// keeps `run` terminating in the presence of repeats.
    pub fn run(&self) {
        let horizon = {
            let state = self.core.state.lock().expect(ERR_POISONED_LOCK);
            state
                .jobs
                .iter()
                .map(|job| job.date)
                .max()
                .unwrap_or(state.now)
        };

        self.advance_to(horizon);
    }
}

impl Scheduler for TestScheduler {
    fn schedule(&self, action: Action) -> Option<AnyDisposable> {
        Some(self.enqueue(self.now(), Work::Once(action)))
    }
}

impl DateScheduler for TestScheduler {
    fn now(&self) -> Instant {
        self.core.state.lock().expect(ERR_POISONED_LOCK).now
    }

    fn schedule_at(&self, date: Instant, action: Action) -> AnyDisposable {
        self.enqueue(date, Work::Once(action))
    }

    fn schedule_recurring(
        &self,
        first: Instant,
        interval: Duration,
        leeway: Duration,
        action: RecurringAction,
    ) -> AnyDisposable {
        self.enqueue(
            first,
            Work::Recurring {
                interval,
                leeway,
                action,
            },
        )
    }
}

impl Default for TestScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TestScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.core.state.lock().expect(ERR_POISONED_LOCK);
        f.debug_struct("TestScheduler")
            .field("pending", &state.jobs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::channel;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(TestScheduler: Send, Sync);

    #[test]
    fn nothing_runs_until_the_clock_moves() {
        let scheduler = TestScheduler::new();
        let (tx, rx) = channel();

        drop(scheduler.schedule(Box::new(move || {
            tx.send(()).unwrap();
        })));

        assert!(rx.try_recv().is_err());

        scheduler.advance();
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn advance_to_midpoint_runs_only_earlier_actions() {
        let scheduler = TestScheduler::new();
        let base = scheduler.now();
        let (tx, rx) = channel();

        for (label, seconds) in [("t1", 1), ("t2", 2), ("t3", 3)] {
            let tx = tx.clone();
            drop(scheduler.schedule_at(
                base + Duration::from_secs(seconds),
                Box::new(move || {
                    tx.send(label).unwrap();
                }),
            ));
        }

        scheduler.advance_to(base + Duration::from_secs(2));

        assert_eq!(rx.try_recv().unwrap(), "t1");
        assert_eq!(rx.try_recv().unwrap(), "t2");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn equal_dates_run_in_submission_order() {
        let scheduler = TestScheduler::new();
        let date = scheduler.now() + Duration::from_secs(1);
        let (tx, rx) = channel();

        for i in 0..5 {
            let tx = tx.clone();
            drop(scheduler.schedule_at(
                date,
                Box::new(move || {
                    tx.send(i).unwrap();
                }),
            ));
        }

        scheduler.advance_by(Duration::from_secs(1));

        let observed: Vec<_> = rx.try_iter().collect();
        assert_eq!(observed, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn action_observes_its_own_scheduled_date() {
        let scheduler = TestScheduler::new();
        let date = scheduler.now() + Duration::from_secs(7);
        let (tx, rx) = channel();

        let observer = scheduler.clone();
        drop(scheduler.schedule_at(
            date,
            Box::new(move || {
                tx.send(observer.now()).unwrap();
            }),
        ));

        scheduler.advance_by(Duration::from_secs(60));

        assert_eq!(rx.try_recv().unwrap(), date);
        assert_eq!(scheduler.now(), date + Duration::from_secs(53));
    }

    #[test]
    fn recurring_action_fires_every_interval() {
        let scheduler = TestScheduler::new();
        let (tx, rx) = channel();

        drop(scheduler.schedule_recurring(
            scheduler.now() + Duration::from_secs(1),
            Duration::from_secs(1),
            Duration::ZERO,
            Box::new(move || {
                tx.send(()).unwrap();
            }),
        ));

        scheduler.advance_by(Duration::from_secs(4));

        assert_eq!(rx.try_iter().count(), 4);
    }

    #[test]
    fn disposing_recurring_handle_stops_queued_occurrences() {
        let scheduler = TestScheduler::new();
        let (tx, rx) = channel();

        let handle = scheduler.schedule_recurring(
            scheduler.now() + Duration::from_secs(1),
            Duration::from_secs(1),
            Duration::ZERO,
            Box::new(move || {
                tx.send(()).unwrap();
            }),
        );

        scheduler.advance_by(Duration::from_secs(2));
        assert_eq!(rx.try_iter().count(), 2);

        // The next occurrence is already queued; disposal must still stop it.
        handle.dispose();
        scheduler.advance_by(Duration::from_secs(10));

        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn run_executes_everything_within_the_pending_horizon() {
        let scheduler = TestScheduler::new();
        let base = scheduler.now();
        let (tx, rx) = channel();

        let once_tx = tx.clone();
        drop(scheduler.schedule_at(
            base + Duration::from_secs(10),
            Box::new(move || {
                once_tx.send("once").unwrap();
            }),
        ));

        drop(scheduler.schedule_recurring(
            base + Duration::from_secs(2),
            Duration::from_secs(2),
            Duration::ZERO,
            Box::new(move || {
                tx.send("tick").unwrap();
            }),
        ));

        scheduler.run();

        let observed: Vec<_> = rx.try_iter().collect();
        // Ticks at 2, 4, 6, 8 and 10 fall within the horizon set by the
        // once action; the tick queued for 12 does not.
        assert_eq!(
            observed,
            vec!["tick", "tick", "tick", "tick", "once", "tick"]
        );
    }

    #[test]
    fn advancing_to_the_past_is_a_noop() {
        let scheduler = TestScheduler::new();
        let now = scheduler.now();

        scheduler.advance_by(Duration::from_secs(5));
        scheduler.advance_to(now);

        assert_eq!(scheduler.now(), now + Duration::from_secs(5));
    }
}
