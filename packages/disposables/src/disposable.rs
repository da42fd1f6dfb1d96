/// A one-shot cancellation capability.
///
/// Implementations transition from active to disposed exactly once and never
/// back. [`dispose`][Self::dispose] is safe to call multiple times and from
/// multiple threads concurrently: only the first caller's transition runs any
/// teardown, and by the time any `dispose` call returns the teardown has
/// completed.
///
/// Calling `dispose` re-entrantly from within the teardown action itself is
/// unsupported and deadlocks.
pub trait Disposable {
    /// Performs the transition to the disposed state, running the teardown
    /// action if this caller is the first.
    ///
    /// Returns only after the teardown action (if any) has completed,
    /// regardless of which caller won the transition.
    fn dispose(&self);

    /// Whether this disposable has been disposed.
    fn is_disposed(&self) -> bool;
}

impl<D> Disposable for Box<D>
where
    D: Disposable + ?Sized,
{
    fn dispose(&self) {
        (**self).dispose();
    }

    fn is_disposed(&self) -> bool {
        (**self).is_disposed()
    }
}
