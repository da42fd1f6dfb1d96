use std::fmt;
use std::sync::{Arc, Mutex};

use crate::{Disposable, ERR_POISONED_LOCK};

type Inner = Box<dyn Disposable + Send + Sync>;

/// A rebindable slot holding at most one live inner disposable.
///
/// Installing a new inner disposable disposes the previous occupant first.
/// Disposing the slot disposes the occupant and latches the disposed state:
/// anything installed afterwards is disposed immediately instead of stored.
///
/// Typical use is serial work where starting the next unit must cancel the
/// previous one, such as rescheduled timers or replaced subscriptions.
///
/// # Example
///
/// ```rust
/// use disposables::{AnyDisposable, Disposable, SerialDisposable};
///
/// let slot = SerialDisposable::new();
///
/// let first = AnyDisposable::empty();
/// slot.set_inner(first.clone());
///
/// // Replacing the occupant disposes it.
/// slot.set_inner(AnyDisposable::empty());
/// assert!(first.is_disposed());
/// ```
#[derive(Clone)]
pub struct SerialDisposable {
    core: Arc<Core>,
}

struct Core {
    state: Mutex<State>,
}

struct State {
    disposed: bool,
    inner: Option<Inner>,
}

impl SerialDisposable {
    /// Creates an empty, active slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: Arc::new(Core {
                state: Mutex::new(State {
                    disposed: false,
                    inner: None,
                }),
            }),
        }
    }

    /// Installs `disposable` as the slot's occupant.
    ///
    /// The previous occupant, if any, is disposed. If the slot itself has
    /// been disposed, `disposable` is disposed immediately and not stored.
    pub fn set_inner(&self, disposable: impl Disposable + Send + Sync + 'static) {
        let mut guard = self.core.state.lock().expect(ERR_POISONED_LOCK);

        if guard.disposed {
            drop(guard);
            disposable.dispose();
            return;
        }

        let previous = guard.inner.replace(Box::new(disposable));
        drop(guard);

        if let Some(previous) = previous {
            previous.dispose();
        }
    }
}

impl Disposable for SerialDisposable {
    fn dispose(&self) {
        let mut guard = self.core.state.lock().expect(ERR_POISONED_LOCK);
        guard.disposed = true;
        let inner = guard.inner.take();
        drop(guard);

        if let Some(inner) = inner {
            inner.dispose();
        }
    }

    fn is_disposed(&self) -> bool {
        self.core.state.lock().expect(ERR_POISONED_LOCK).disposed
    }
}

impl Default for SerialDisposable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SerialDisposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.core.state.lock().expect(ERR_POISONED_LOCK);
        f.debug_struct("SerialDisposable")
            .field("disposed", &guard.disposed)
            .field("occupied", &guard.inner.is_some())
            .finish()
    }
}
