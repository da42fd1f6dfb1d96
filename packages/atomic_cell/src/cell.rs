use std::mem;
use std::sync::Mutex;

use crate::ERR_POISONED_LOCK;

/// A container for a single value, guarded by a lock.
///
/// Every operation acquires the lock for its full duration, so no two
/// concurrent callers can observe or produce an inconsistent intermediate
/// state. The compound operations ([`modify`][Self::modify],
/// [`with_value`][Self::with_value], [`with_mut`][Self::with_mut]) run their
/// closure while the lock is held, which allows read-then-decide logic without
/// a second acquisition.
///
/// The closures handed to the compound operations must not call back into the
/// same cell - the lock is not re-entrant and doing so deadlocks.
///
/// # Example
///
/// ```rust
/// use atomic_cell::AtomicCell;
///
/// let counter = AtomicCell::new(0_u64);
///
/// let previous = counter.modify(|current| current + 1);
/// assert_eq!(previous, 0);
/// assert_eq!(counter.get(), 1);
/// ```
#[derive(Debug, Default)]
pub struct AtomicCell<T> {
    value: Mutex<T>,
}

impl<T> AtomicCell<T> {
    /// Creates a new cell holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }

    /// Consumes the cell and returns the contained value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value.into_inner().expect(ERR_POISONED_LOCK)
    }

    /// Atomically replaces the value.
    pub fn set(&self, value: T) {
        *self.value.lock().expect(ERR_POISONED_LOCK) = value;
    }

    /// Atomically replaces the value and returns the previous one.
    pub fn swap(&self, value: T) -> T {
        mem::replace(&mut *self.value.lock().expect(ERR_POISONED_LOCK), value)
    }

    /// Atomically replaces the value with `f(current)` and returns the
    /// previous value.
    ///
    /// `f` runs while the lock is held and must not call back into this cell.
    pub fn modify(&self, f: impl FnOnce(&T) -> T) -> T {
        let mut guard = self.value.lock().expect(ERR_POISONED_LOCK);
        let next = f(&guard);
        mem::replace(&mut *guard, next)
    }

    /// Runs `f` with a shared reference to the current value, holding the lock
    /// for the duration, and returns `f`'s result.
    ///
    /// `f` must not call back into this cell.
    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.lock().expect(ERR_POISONED_LOCK))
    }

    /// Runs `f` with an exclusive reference to the current value, holding the
    /// lock for the duration, and returns `f`'s result.
    ///
    /// This is the mutation counterpart of [`with_value`][Self::with_value],
    /// for in-place updates of values that are expensive to replace wholesale.
    /// `f` must not call back into this cell.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.value.lock().expect(ERR_POISONED_LOCK))
    }
}

impl<T> AtomicCell<T>
where
    T: Clone,
{
    /// Returns a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.value.lock().expect(ERR_POISONED_LOCK).clone()
    }
}

impl<T> From<T> for AtomicCell<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(AtomicCell<usize>: Send, Sync);

    #[test]
    fn get_returns_initial_value() {
        let cell = AtomicCell::new(42);

        assert_eq!(cell.get(), 42);
    }

    #[test]
    fn set_replaces_value() {
        let cell = AtomicCell::new(1);

        cell.set(2);

        assert_eq!(cell.get(), 2);
    }

    #[test]
    fn swap_returns_previous_value() {
        let cell = AtomicCell::new("before");

        let previous = cell.swap("after");

        assert_eq!(previous, "before");
        assert_eq!(cell.get(), "after");
    }

    #[test]
    fn modify_applies_function_and_returns_previous() {
        let cell = AtomicCell::new(10);

        let previous = cell.modify(|current| current * 3);

        assert_eq!(previous, 10);
        assert_eq!(cell.get(), 30);
    }

    #[test]
    fn with_value_observes_without_replacing() {
        let cell = AtomicCell::new(vec![1, 2, 3]);

        let len = cell.with_value(Vec::len);

        assert_eq!(len, 3);
        assert_eq!(cell.get(), vec![1, 2, 3]);
    }

    #[test]
    fn with_mut_updates_in_place() {
        let cell = AtomicCell::new(vec![1, 2]);

        cell.with_mut(|values| values.push(3));

        assert_eq!(cell.get(), vec![1, 2, 3]);
    }

    #[test]
    fn into_inner_returns_value() {
        let cell = AtomicCell::new(String::from("owned"));

        assert_eq!(cell.into_inner(), "owned");
    }

    #[test]
    fn concurrent_modify_loses_no_increments() {
        const THREADS: usize = 8;
        const INCREMENTS: usize = 1000;

        let cell = Arc::new(AtomicCell::new(0_usize));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let cell = Arc::clone(&cell);
                thread::spawn(move || {
                    for _ in 0..INCREMENTS {
                        cell.modify(|current| current + 1);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cell.get(), THREADS * INCREMENTS);
    }
}
