use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::{Disposable, ERR_POISONED_LOCK};

type Action = Box<dyn FnOnce() + Send>;

/// A one-shot action behind a cloneable, thread-safe handle.
///
/// The action runs at most once. The first [`dispose`][Disposable::dispose]
/// call from any clone runs it while holding an internal lock, so every
/// concurrent `dispose` call returns only after the action has finished.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use disposables::{AnyDisposable, Disposable};
///
/// let runs = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&runs);
///
/// let disposable = AnyDisposable::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// disposable.dispose();
/// disposable.dispose();
///
/// assert_eq!(runs.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone)]
pub struct AnyDisposable {
    core: Arc<Core>,
}

struct Core {
    /// Set before the action runs; never cleared.
    disposed: AtomicBool,

    /// Taken by the winning `dispose` call. The action runs while this lock
    /// is held so that racing callers block until it has completed.
    action: Mutex<Option<Action>>,
}

impl AnyDisposable {
    /// Creates a disposable that runs `action` on its first disposal.
    #[must_use]
    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            core: Arc::new(Core {
                disposed: AtomicBool::new(false),
                action: Mutex::new(Some(Box::new(action))),
            }),
        }
    }

    /// Creates a disposable with no action; disposal only flips the state.
    ///
    /// Useful as a pure cancellation flag or as an already-spent placeholder.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            core: Arc::new(Core {
                disposed: AtomicBool::new(false),
                action: Mutex::new(None),
            }),
        }
    }

    /// Creates a disposable that is already in the disposed state.
    #[must_use]
    pub fn disposed() -> Self {
        let disposable = Self::empty();
        disposable.dispose();
        disposable
    }
}

impl Disposable for AnyDisposable {
    fn dispose(&self) {
        let mut guard = self.core.action.lock().expect(ERR_POISONED_LOCK);

        self.core.disposed.store(true, Ordering::Release);

        if let Some(action) = guard.take() {
            action();
        }
    }

    fn is_disposed(&self) -> bool {
        self.core.disposed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for AnyDisposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyDisposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
