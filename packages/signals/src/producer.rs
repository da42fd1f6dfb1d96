use std::fmt;
use std::sync::{Arc, Weak};

use disposables::{AnyDisposable, CompositeDisposable, Disposable};

use crate::{Event, Observer, Signal, Sink};

/// A cold event stream: a recipe for producing events.
///
/// Where a [`Signal`] runs its generator once and shares the stream, a
/// producer stores the generator and runs it afresh on every
/// [`start`][Self::start], so each observer gets its own private run of the
/// production - its own side effects, its own resources, its own teardown.
///
/// Disposing the handle returned by `start` detaches the observer first (it
/// receives nothing further) and then interrupts that run's signal, which
/// disposes every resource the generator registered.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use signals::{Observer, SignalProducer};
///
/// let producer = SignalProducer::<i32, String>::new(|sink, _resources| {
///     sink.send_value(1);
///     sink.send_value(2);
///     sink.send_completed();
/// });
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let record = Arc::clone(&seen);
/// producer.start(Observer::values(move |value| {
///     record.lock().unwrap().push(value);
/// }));
///
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
/// ```
pub struct SignalProducer<V, F> {
    generator: Arc<dyn Fn(Sink<V, F>, &CompositeDisposable) + Send + Sync>,
}

impl<V, F> SignalProducer<V, F>
where
    V: Send + 'static,
    F: Send + 'static,
{
    /// Creates a producer from a generator that is re-run for every start.
    ///
    /// The generator receives the sink for its private signal and the
    /// aggregate disposable for the resources it allocates. Resources are
    /// disposed when that run terminates or is cancelled. A generator that
    /// intends to keep producing after it returns must retain a clone of the
    /// sink; once every clone is gone the run is interrupted.
    #[must_use]
    pub fn new(generator: impl Fn(Sink<V, F>, &CompositeDisposable) + Send + Sync + 'static) -> Self {
        Self {
            generator: Arc::new(generator),
        }
    }

    /// Runs the generator for `observer` and returns the cancellation
    /// handle for this run.
    pub fn start(&self, observer: Observer<V, F>) -> AnyDisposable {
        let (sink, signal) = Signal::pipe();

        // The observer joins before the generator runs so a synchronous
        // production is not lost - this is what makes the producer cold.
        let subscription = signal.observe(observer);

        (self.generator)(sink, &signal.core.resources);

        let core = Arc::downgrade(&signal.core);
        AnyDisposable::new(move || {
            // Detach first: the interruption below must not reach the
            // observer that asked for cancellation.
            subscription.dispose();

            if let Some(core) = Weak::upgrade(&core) {
                core.terminate(|| Event::Interrupted);
            }
        })
    }
}

impl<V, F> Clone for SignalProducer<V, F> {
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
        }
    }
}

impl<V, F> fmt::Debug for SignalProducer<V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalProducer").finish_non_exhaustive()
    }
}
