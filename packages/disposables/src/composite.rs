use std::fmt;
use std::ops::AddAssign;
use std::sync::{Arc, Mutex, Weak};

use token_bag::Bag;

use crate::{AnyDisposable, Disposable, ERR_POISONED_LOCK};

type Member = Box<dyn Disposable + Send + Sync>;

/// A group of disposables that are all disposed together.
///
/// Disposing the group disposes every member in insertion order and empties
/// the group. A member added after the group has been disposed is disposed
/// immediately instead of being stored, so no cancellation token can outlive
/// its group unnoticed.
///
/// [`add`][Self::add] returns a handle that detaches the member from the
/// group without disposing it, for members whose lifetime ends before the
/// group's.
///
/// # Example
///
/// ```rust
/// use disposables::{AnyDisposable, CompositeDisposable, Disposable};
///
/// let mut group = CompositeDisposable::new();
///
/// group += AnyDisposable::new(|| println!("resource released"));
/// group.dispose();
///
/// // Late additions are disposed on the spot.
/// let late = AnyDisposable::new(|| println!("late teardown"));
/// group.add(late.clone());
/// assert!(late.is_disposed());
/// ```
#[derive(Clone)]
pub struct CompositeDisposable {
    core: Arc<Core>,
}

/// `None` means the group has been disposed.
struct Core {
    members: Mutex<Option<Bag<Member>>>,
}

impl CompositeDisposable {
    /// Creates an empty, active group.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: Arc::new(Core {
                members: Mutex::new(Some(Bag::new())),
            }),
        }
    }

    /// Adds `disposable` to the group.
    ///
    /// If the group is already disposed, `disposable` is disposed immediately
    /// and an already-disposed handle is returned. Otherwise the returned
    /// handle detaches the member from the group without disposing it;
    /// disposing the group still disposes every member that has not been
    /// detached.
    pub fn add(&self, disposable: impl Disposable + Send + Sync + 'static) -> AnyDisposable {
        let mut guard = self.core.members.lock().expect(ERR_POISONED_LOCK);

        let Some(members) = guard.as_mut() else {
            drop(guard);
            disposable.dispose();
            return AnyDisposable::disposed();
        };

        let token = members.insert(Box::new(disposable));
        drop(guard);

        let core = Arc::downgrade(&self.core);
        AnyDisposable::new(move || {
            if let Some(core) = Weak::upgrade(&core) {
                if let Some(members) = core.members.lock().expect(ERR_POISONED_LOCK).as_mut() {
                    members.remove(&token);
                }
            }
        })
    }
}

impl Disposable for CompositeDisposable {
    fn dispose(&self) {
        let members = self
            .core
            .members
            .lock()
            .expect(ERR_POISONED_LOCK)
            .take();

        // Members are disposed outside the lock so their actions may add to
        // the group (the addition is then disposed immediately) without
        // deadlocking.
        if let Some(mut members) = members {
            for member in members.drain() {
                member.dispose();
            }
        }
    }

    fn is_disposed(&self) -> bool {
        self.core
            .members
            .lock()
            .expect(ERR_POISONED_LOCK)
            .is_none()
    }
}

impl<D> AddAssign<D> for CompositeDisposable
where
    D: Disposable + Send + Sync + 'static,
{
    /// Adds a member, discarding the detach handle.
    fn add_assign(&mut self, disposable: D) {
        drop(self.add(disposable));
    }
}

impl Default for CompositeDisposable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CompositeDisposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeDisposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
