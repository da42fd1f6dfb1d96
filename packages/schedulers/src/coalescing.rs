use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle, ThreadId};

use disposables::{AnyDisposable, Disposable};

use crate::{Action, ERR_POISONED_LOCK, Scheduler};

/// Funnels every action onto one designated thread, preserving submission
/// order.
///
/// When [`schedule`][Scheduler::schedule] is called on the designated thread
/// itself and no other action is pending, the action runs synchronously for
/// latency - this is the coalescing fast path that keeps follow-up work
/// scheduled from within an action on the same thread without a queue
/// round-trip. In every other case the action is queued, and queued actions
/// run strictly in the order they were submitted.
///
/// The scheduler owns its designated thread. Handles are cloneable; the
/// thread winds down when the last handle is dropped.
///
/// # Example
///
/// ```rust
/// use schedulers::{CoalescingScheduler, Scheduler};
///
/// let scheduler = CoalescingScheduler::new();
/// let (tx, rx) = std::sync::mpsc::channel();
///
/// scheduler.schedule(Box::new(move || {
///     tx.send("ran on the designated thread").unwrap();
/// }));
///
/// assert_eq!(rx.recv().unwrap(), "ran on the designated thread");
/// ```
#[derive(Clone)]
pub struct CoalescingScheduler {
    core: Arc<Core>,
}

struct Core {
    sender: Mutex<Option<Sender<Action>>>,

    /// Identity of the designated thread, compared for the fast path.
    thread_id: ThreadId,

    /// Number of actions submitted but not yet finished. The fast path is
    /// only taken when this is zero, which preserves submission order.
    pending: AtomicUsize,

    worker: Mutex<Option<JoinHandle<()>>>,
}

impl CoalescingScheduler {
    /// Creates a scheduler with a freshly spawned designated thread.
    ///
    /// # Panics
    ///
    /// Panics if the thread cannot be spawned.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel::<Action>();

        let worker = thread::Builder::new()
            .name("coalescing-scheduler".to_string())
            .spawn(move || {
                while let Ok(action) = receiver.recv() {
                    action();
                }
            })
            .expect("failed to spawn the designated scheduler thread");

        let thread_id = worker.thread().id();

        Self {
            core: Arc::new(Core {
                sender: Mutex::new(Some(sender)),
                thread_id,
                pending: AtomicUsize::new(0),
                worker: Mutex::new(Some(worker)),
            }),
        }
    }
}

impl Scheduler for CoalescingScheduler {
    fn schedule(&self, action: Action) -> Option<AnyDisposable> {
        let position = self.core.pending.fetch_add(1, Ordering::SeqCst) + 1;

        // Already on the designated thread with nothing queued ahead of us:
        // run inline instead of taking a queue round-trip.
        if position == 1 && thread::current().id() == self.core.thread_id {
            self.core.pending.fetch_sub(1, Ordering::SeqCst);
            action();
            return None;
        }

        let cancel = AnyDisposable::empty();
        let suppressed = cancel.clone();
        let core = Arc::clone(&self.core);

        let job: Action = Box::new(move || {
            core.pending.fetch_sub(1, Ordering::SeqCst);
            if !suppressed.is_disposed() {
                action();
            }
        });

        let guard = self.core.sender.lock().expect(ERR_POISONED_LOCK);
        if let Some(sender) = guard.as_ref() {
            // The worker only exits once every sender is gone, so this send
            // cannot fail while we hold a live handle.
            sender
                .send(job)
                .expect("designated scheduler thread exited while handles were live");
        }

        Some(cancel)
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain what was queued and exit.
        drop(self.sender.lock().expect(ERR_POISONED_LOCK).take());

        // If the final handle is dropped from within a scheduled action we
        // are on the worker itself and must not join it.
        if thread::current().id() == self.thread_id {
            return;
        }

        if let Some(worker) = self.worker.lock().expect(ERR_POISONED_LOCK).take() {
            drop(worker.join());
        }
    }
}

impl Default for CoalescingScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CoalescingScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoalescingScheduler")
            .field("thread_id", &self.core.thread_id)
            .field("pending", &self.core.pending.load(Ordering::Relaxed))
            .finish()
    }
}
