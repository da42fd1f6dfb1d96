use std::collections::BinaryHeap;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use disposables::{AnyDisposable, Disposable};

use crate::job::{Job, Work};
use crate::{Action, DateScheduler, ERR_POISONED_LOCK, RecurringAction, Scheduler};

/// A serial scheduler backed by a named, dedicated worker thread.
///
/// Actions execute strictly one at a time. Immediate submissions run in
/// submission order; future-dated submissions run in date order, with equal
/// dates resolved by submission order. Repeating actions reschedule
/// themselves every interval until the returned disposable is disposed.
///
/// Handles are cloneable and share the worker; the worker drains nothing and
/// exits when the last handle is dropped.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
///
/// use schedulers::{DateScheduler, QueueScheduler, Scheduler};
///
/// let scheduler = QueueScheduler::new("background-work");
/// let (tx, rx) = std::sync::mpsc::channel();
///
/// scheduler.schedule_after(
///     Duration::from_millis(10),
///     Box::new(move || {
///         tx.send("done").unwrap();
///     }),
/// );
///
/// assert_eq!(rx.recv().unwrap(), "done");
/// ```
#[derive(Clone)]
pub struct QueueScheduler {
    core: Arc<Core>,
}

struct Core {
    shared: Arc<Shared>,
    thread_id: ThreadId,
    worker: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    state: Mutex<State>,
    available: Condvar,
}

struct State {
    jobs: BinaryHeap<Job>,
    next_seq: u64,
    shutdown: bool,
}

impl QueueScheduler {
    /// Creates a scheduler whose worker thread carries the given name.
    ///
    /// # Panics
    ///
    /// Panics if the thread cannot be spawned.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                jobs: BinaryHeap::new(),
                next_seq: 0,
                shutdown: false,
            }),
            available: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run_worker(&worker_shared))
            .expect("failed to spawn the queue scheduler worker thread");

        let thread_id = worker.thread().id();

        Self {
            core: Arc::new(Core {
                shared,
                thread_id,
                worker: Mutex::new(Some(worker)),
            }),
        }
    }

    fn enqueue(&self, date: Instant, work: Work) -> AnyDisposable {
        let cancel = AnyDisposable::empty();

        let mut state = self.core.shared.state.lock().expect(ERR_POISONED_LOCK);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.jobs.push(Job {
            date,
            seq,
            work,
            cancel: cancel.clone(),
        });
        drop(state);

        self.core.shared.available.notify_all();
        cancel
    }
}

/// Leeway applied to jobs that were not given one.
const NO_LEEWAY: Duration = Duration::ZERO;

fn run_worker(shared: &Shared) {
    loop {
        let mut state = shared.state.lock().expect(ERR_POISONED_LOCK);

        // Wait until a job is due or we are asked to shut down.
        let job = loop {
            if state.shutdown {
                return;
            }

            match state.jobs.peek() {
                None => {
                    state = shared.available.wait(state).expect(ERR_POISONED_LOCK);
                }
                Some(job) => {
                    let now = Instant::now();
                    let due_at = effective_date(job);

                    if due_at <= now {
                        break state
                            .jobs
                            .pop()
                            .expect("peeked job disappeared while the lock was held");
                    }

                    let timeout = due_at.saturating_duration_since(now);
                    state = shared
                        .available
                        .wait_timeout(state, timeout)
                        .expect(ERR_POISONED_LOCK)
                        .0;
                }
            }
        };

        // The lock is never held across the action: the action is user code
        // and may itself submit to this scheduler.
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

                // Disposal during the run still wins: the next occurrence is
                // only queued for a live cancellation handle.
                if job.cancel.is_disposed() {
                    continue;
                }

                let mut state = shared.state.lock().expect(ERR_POISONED_LOCK);
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

/// The date at which a job becomes eligible to run, its leeway applied.
///
/// Leeway is a tolerance window: firing an occurrence early by up to the
/// leeway lets the worker coalesce wakeups instead of sleeping twice for two
/// nearby deadlines.
fn effective_date(job: &Job) -> Instant {
    let leeway = match &job.work {
        Work::Once(_) => NO_LEEWAY,
        Work::Recurring { leeway, .. } => *leeway,
    };

    job.date.checked_sub(leeway).unwrap_or(job.date)
}

impl Scheduler for QueueScheduler {
    fn schedule(&self, action: Action) -> Option<AnyDisposable> {
        Some(self.enqueue(Instant::now(), Work::Once(action)))
    }
}

impl DateScheduler for QueueScheduler {
    fn now(&self) -> Instant {
        Instant::now()
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

impl Drop for Core {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock().expect(ERR_POISONED_LOCK);
            state.shutdown = true;
        }
        self.shared.available.notify_all();

        // If the final handle was dropped from within a scheduled action we
        // are on the worker itself and must not join it.
        if thread::current().id() == self.thread_id {
            return;
        }

        if let Some(worker) = self.worker.lock().expect(ERR_POISONED_LOCK).take() {
            drop(worker.join());
        }
    }
}

impl fmt::Debug for QueueScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.core.shared.state.lock().expect(ERR_POISONED_LOCK);
        f.debug_struct("QueueScheduler")
            .field("pending", &state.jobs.len())
            .field("shutdown", &state.shutdown)
            .finish()
    }
}
