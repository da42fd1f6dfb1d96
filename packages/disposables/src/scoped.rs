use std::fmt;

use crate::Disposable;

/// Disposes its inner disposable when dropped.
///
/// Binding cancellation to a scope avoids the reference cycle that would
/// otherwise arise from a producer and an observer each keeping the other
/// alive: the observer owns the scoped wrapper, and the wrapper reaches the
/// producer only through the plain disposal action.
///
/// The wrapper is deliberately not cloneable; the scope that owns it is the
/// single point of teardown. The inner disposable can still be disposed
/// early through [`Disposable::dispose`].
///
/// # Example
///
/// ```rust
/// use disposables::{AnyDisposable, Disposable, ScopedDisposable};
///
/// let teardown = AnyDisposable::empty();
///
/// {
///     let _scoped = ScopedDisposable::new(teardown.clone());
/// } // scope ends, teardown runs
///
/// assert!(teardown.is_disposed());
/// ```
pub struct ScopedDisposable {
    inner: Box<dyn Disposable + Send + Sync>,
}

impl ScopedDisposable {
    /// Wraps `disposable` so it is disposed when the wrapper drops.
    #[must_use]
    pub fn new(disposable: impl Disposable + Send + Sync + 'static) -> Self {
        Self {
            inner: Box::new(disposable),
        }
    }
}

impl Disposable for ScopedDisposable {
    fn dispose(&self) {
        self.inner.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }
}

impl Drop for ScopedDisposable {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

impl fmt::Debug for ScopedDisposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedDisposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
