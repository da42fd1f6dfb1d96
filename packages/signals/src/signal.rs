use std::fmt;
use std::sync::{Arc, Mutex, TryLockError, Weak};

use atomic_cell::AtomicCell;
use disposables::{AnyDisposable, CompositeDisposable, Disposable};
use token_bag::Bag;

use crate::{ERR_POISONED_LOCK, Event, Observer};

/// A hot, multicast event stream.
///
/// Observers join and leave dynamically; every event pushed through the
/// signal's [`Sink`] is delivered to each observer registered at that moment,
/// in subscription order. A terminal event is delivered at most once per
/// observer and is always the last delivery; after it, the signal ignores
/// all further pushes and releases the resources its generator registered.
///
/// The signal owns its observers outright. Observers carry no back-reference
/// to the signal, and a subscription's lifetime is tracked solely through the
/// disposable returned by [`observe`][Self::observe], so no reference cycle
/// can form between producer and observer.
///
/// Cloning the signal clones a handle to the same stream.
///
/// # Concurrency
///
/// Subscribing, unsubscribing and pushing are all safe from any thread.
/// Delivery passes are serialized per signal: the observer list is
/// snapshotted and a send lock is held while the snapshot is walked, so a
/// terminal event can never overtake a value that is already mid-delivery. A
/// terminal push that arrives during a value pass does not block; it is
/// recorded and delivered by the in-flight pass as its last act.
///
/// The observer-registry lock is distinct from the send lock, so callbacks
/// may freely subscribe, unsubscribe or send a terminal event. Pushing a
/// *value* into the same signal from within an observer callback is
/// unsupported and deadlocks. A delivery that is already in flight may still
/// reach an observer whose disposal is racing it; the disposal itself never
/// blocks on the delivery.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use signals::{Event, Observer, Signal};
///
/// let (sink, signal) = Signal::<i32, String>::pipe();
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let record = Arc::clone(&seen);
/// let subscription = signal.observe(Observer::values(move |value| {
///     record.lock().unwrap().push(value);
/// }));
///
/// sink.send_value(1);
/// sink.send_value(2);
///
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
/// # drop(subscription);
/// ```
pub struct Signal<V, F> {
    pub(crate) core: Arc<Core<V, F>>,
}

pub(crate) struct Core<V, F> {
    /// The live observers. Guarded by the cell; never locked while observer
    /// callbacks run.
    observers: AtomicCell<Bag<Observer<V, F>>>,

    /// Flips to `true` exactly once. The push that wins the flip stages the
    /// terminal event and tears the registry down; everything after is a
    /// no-op.
    terminated: AtomicCell<bool>,

    /// Held for the duration of every delivery pass. Serializes passes so a
    /// terminal event can never reach an observer before a value that was
    /// already mid-delivery when the terminal was pushed.
    send_lock: Mutex<()>,

    /// The terminal event staged by the terminated-flip winner, waiting for
    /// whichever party next holds the send lock to deliver it.
    pending_terminal: Mutex<Option<PendingTerminal<V, F>>>,

    /// Resources registered by the generator, disposed on termination or
    /// unsubscription of the producing scope.
    pub(crate) resources: CompositeDisposable,
}

/// The staged terminal: one prebuilt event per observer that was registered
/// at termination time.
struct PendingTerminal<V, F> {
    deliveries: Vec<(Observer<V, F>, Event<V, F>)>,
}

impl<V, F> Core<V, F> {
    fn new() -> Self {
        Self {
            observers: AtomicCell::new(Bag::new()),
            terminated: AtomicCell::new(false),
            send_lock: Mutex::new(()),
            pending_terminal: Mutex::new(None),
            resources: CompositeDisposable::new(),
        }
    }

    fn snapshot(&self) -> Vec<Observer<V, F>> {
        self.observers
            .with_value(|bag| bag.iter().cloned().collect())
    }

    /// Delivers a value event to every currently registered observer, in
    /// subscription order. Dropped silently once the signal has terminated.
    pub(crate) fn push_value(&self, value: V)
    where
        V: Clone,
    {
        {
            let _sending = self.send_lock.lock().expect(ERR_POISONED_LOCK);

            if !self.terminated.get() {
                for observer in self.snapshot() {
                    observer.send(Event::Value(value.clone()));
                }
            }
        }

        // A terminal push that arrived during the pass above deferred to us
        // rather than overtaking it; deliver it now that the pass is done.
        if self.terminated.get() {
            self.commit_termination();
        }
    }

    /// Runs the terminal protocol: exactly one caller wins the terminated
    /// flip; the winner empties the observer bag (invalidating every
    /// subscription token) and stages the terminal event. The event is
    /// delivered - and the generator's resources disposed - under the send
    /// lock, either here or, if a value pass is in flight, by that pass once
    /// it completes. Never blocks on an in-flight pass.
    pub(crate) fn terminate(&self, make_event: impl Fn() -> Event<V, F>) {
        let already_terminated = self.terminated.swap(true);
        if already_terminated {
            return;
        }

        let observers = self.observers.with_mut(|bag| {
            let snapshot: Vec<_> = bag.iter().cloned().collect();
            bag.clear();
            snapshot
        });

        let deliveries = observers
            .into_iter()
            .map(|observer| (observer, make_event()))
            .collect();

        *self.pending_terminal.lock().expect(ERR_POISONED_LOCK) =
            Some(PendingTerminal { deliveries });

        self.commit_termination();
    }

    /// Delivers the staged terminal event if the send lock can be taken
    /// without waiting.
    ///
    /// When the lock is contended the current holder is a delivery pass that
    /// checks for a staged terminal before finishing, so declining to wait
    /// here never strands the event. Taking the staged value is atomic; a
    /// second committer finds the slot empty and does nothing.
    fn commit_termination(&self) {
        let _sending = match self.send_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return,
            Err(TryLockError::Poisoned(_)) => panic!("{ERR_POISONED_LOCK}"),
        };

        let pending = self.pending_terminal.lock().expect(ERR_POISONED_LOCK).take();

        if let Some(pending) = pending {
            for (observer, event) in pending.deliveries {
                observer.send(event);
            }

            self.resources.dispose();
        }
    }
}

impl<V, F> Signal<V, F>
where
    V: Send + 'static,
    F: Send + 'static,
{
    /// Creates a signal by running `generator` exactly once, immediately.
    ///
    /// The generator receives the outward-facing sink and the aggregate
    /// disposable for the resources it allocates; those resources are
    /// disposed when the signal terminates. Events pushed while no observer
    /// is registered go nowhere - this is a hot signal.
    pub fn new(generator: impl FnOnce(Sink<V, F>, &CompositeDisposable)) -> Self {
        let (sink, signal) = Self::pipe();
        generator(sink, &signal.core.resources);
        signal
    }

    /// Creates a signal together with the sink that pushes into it.
    #[must_use]
    pub fn pipe() -> (Sink<V, F>, Self) {
        let core = Arc::new(Core::new());
        let sink = Sink::new(Arc::clone(&core));
        (sink, Self { core })
    }

    /// Registers `observer` and returns the disposable that cancels the
    /// subscription.
    ///
    /// Disposing the returned handle removes the observer; it receives
    /// nothing afterwards. Disposal is idempotent and safe from any thread,
    /// including from within the observer's own callback.
    ///
    /// An observer attaching after the signal has terminated receives
    /// [`Event::Interrupted`] immediately and an already-disposed handle.
    pub fn observe(&self, observer: Observer<V, F>) -> AnyDisposable {
        if self.core.terminated.get() {
            observer.send(Event::Interrupted);
            return AnyDisposable::disposed();
        }

        let token = self
            .core
            .observers
            .with_mut(|bag| bag.insert(observer.clone()));

        // A terminal event may have slipped in between the check above and
        // the insertion. If it emptied the bag before we inserted, our entry
        // is live but will never be delivered to; claw it back and deliver
        // the interruption ourselves. If it emptied the bag after, our token
        // is already invalidated and the observer got the real terminal.
        if self.core.terminated.get() {
            let was_live = self.core.observers.with_mut(|bag| bag.remove(&token));
            if was_live {
                observer.send(Event::Interrupted);
            }
            return AnyDisposable::disposed();
        }

        let core = Arc::downgrade(&self.core);
        AnyDisposable::new(move || {
            if let Some(core) = Weak::upgrade(&core) {
                core.observers.with_mut(|bag| bag.remove(&token));
            }
        })
    }
}

impl<V, F> Clone for Signal<V, F> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<V, F> fmt::Debug for Signal<V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("observers", &self.core.observers.with_value(Bag::len))
            .field("terminated", &self.core.terminated.get())
            .finish()
    }
}

/// The push handle for a signal.
///
/// Producers call the `send_*` methods to deliver events. Clones share the
/// stream; when the last clone is dropped without a terminal event having
/// been sent, the signal is interrupted automatically so an abandoned
/// producer cannot strand its observers.
pub struct Sink<V, F> {
    core: Arc<Core<V, F>>,

    /// Shared across clones; its drop is the "producer gone" signal.
    owner: Arc<Owner<V, F>>,
}

struct Owner<V, F> {
    core: Arc<Core<V, F>>,
}

impl<V, F> Drop for Owner<V, F> {
    fn drop(&mut self) {
        // No-op if a real terminal event was already delivered.
        self.core.terminate(|| Event::Interrupted);
    }
}

impl<V, F> Sink<V, F> {
    fn new(core: Arc<Core<V, F>>) -> Self {
        Self {
            owner: Arc::new(Owner {
                core: Arc::clone(&core),
            }),
            core,
        }
    }

    /// Pushes a single event.
    pub fn send(&self, event: Event<V, F>)
    where
        V: Clone,
        F: Clone,
    {
        match event {
            Event::Value(value) => self.send_value(value),
            Event::Failed(failure) => self.send_failed(failure),
            Event::Completed => self.send_completed(),
            Event::Interrupted => self.send_interrupted(),
        }
    }

    /// Pushes a value to every current observer.
    pub fn send_value(&self, value: V)
    where
        V: Clone,
    {
        self.core.push_value(value);
    }

    /// Terminates the signal with a failure.
    pub fn send_failed(&self, failure: F)
    where
        F: Clone,
    {
        self.core.terminate(|| Event::Failed(failure.clone()));
    }

    /// Terminates the signal normally.
    pub fn send_completed(&self) {
        self.core.terminate(|| Event::Completed);
    }

    /// Terminates the signal as cancelled.
    pub fn send_interrupted(&self) {
        self.core.terminate(|| Event::Interrupted);
    }
}

impl<V, F> Clone for Sink<V, F> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            owner: Arc::clone(&self.owner),
        }
    }
}

impl<V, F> fmt::Debug for Sink<V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("terminated", &self.core.terminated.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::channel;
    use std::thread;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Signal<i32, String>: Send, Sync);
    assert_impl_all!(Sink<i32, String>: Send, Sync);

    type TestEvent = Event<i32, &'static str>;

    /// Records every delivered event for later assertions.
    fn recording_observer() -> (Observer<i32, &'static str>, Arc<Mutex<Vec<TestEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let observer = Observer::new(move |event| {
            record.lock().unwrap().push(event);
        });
        (observer, seen)
    }

    #[test]
    fn every_observer_sees_events_in_push_order() {
        let (sink, signal) = Signal::pipe();

        let (first, first_seen) = recording_observer();
        let (second, second_seen) = recording_observer();
        let _first_sub = signal.observe(first);
        let _second_sub = signal.observe(second);

        sink.send_value(1);
        sink.send_value(2);
        sink.send_completed();

        let expected = vec![Event::Value(1), Event::Value(2), Event::Completed];
        assert_eq!(*first_seen.lock().unwrap(), expected);
        assert_eq!(*second_seen.lock().unwrap(), expected);
    }

    #[test]
    fn termination_empties_the_observer_bag() {
        let (sink, signal) = Signal::<i32, &'static str>::pipe();

        let (observer, _) = recording_observer();
        let _sub = signal.observe(observer);

        sink.send_completed();

        assert_eq!(signal.core.observers.with_value(Bag::len), 0);
    }

    #[test]
    fn pushes_after_termination_are_dropped() {
        let (sink, signal) = Signal::pipe();

        let (observer, seen) = recording_observer();
        let _sub = signal.observe(observer);

        sink.send_value(1);
        sink.send_value(2);
        sink.send_failed("boom");
        sink.send_completed();
        sink.send_value(3);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Event::Value(1), Event::Value(2), Event::Failed("boom")]
        );
    }

    #[test]
    fn disposed_subscription_receives_nothing_further() {
        let (sink, signal) = Signal::<i32, &'static str>::pipe();

        let (observer, seen) = recording_observer();
        let subscription = signal.observe(observer);

        sink.send_value(1);
        subscription.dispose();
        sink.send_value(2);
        sink.send_completed();

        assert_eq!(*seen.lock().unwrap(), vec![Event::Value(1)]);
    }

    #[test]
    fn disposing_twice_equals_disposing_once() {
        let (sink, signal) = Signal::<i32, &'static str>::pipe();

        let (observer, seen) = recording_observer();
        let subscription = signal.observe(observer);

        subscription.dispose();
        subscription.dispose();
        sink.send_value(1);

        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn late_observer_is_interrupted_immediately() {
        let (sink, signal) = Signal::<i32, &'static str>::pipe();
        sink.send_completed();

        let (observer, seen) = recording_observer();
        let subscription = signal.observe(observer);

        assert_eq!(*seen.lock().unwrap(), vec![Event::Interrupted]);
        assert!(subscription.is_disposed());
    }

    #[test]
    fn dropping_every_sink_interrupts_live_observers() {
        let (sink, signal) = Signal::<i32, &'static str>::pipe();

        let (observer, seen) = recording_observer();
        let _sub = signal.observe(observer);

        let clone = sink.clone();
        sink.send_value(1);
        drop(sink);

        assert_eq!(*seen.lock().unwrap(), vec![Event::Value(1)]);

        drop(clone);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Event::Value(1), Event::Interrupted]
        );
    }

    #[test]
    fn generator_runs_once_and_registers_resources() {
        let teardown = AnyDisposable::empty();
        let registered = teardown.clone();

        let signal = Signal::<i32, &'static str>::new(move |sink, resources| {
            resources.add(registered);
            sink.send_value(1);
            sink.send_completed();
        });

        // The generator completed the signal, so its resources are gone and
        // late observers are interrupted.
        assert!(teardown.is_disposed());

        let (observer, seen) = recording_observer();
        drop(signal.observe(observer));
        assert_eq!(*seen.lock().unwrap(), vec![Event::Interrupted]);
    }

    #[test]
    fn observer_may_dispose_its_own_subscription_mid_delivery() {
        let (sink, signal) = Signal::<i32, &'static str>::pipe();

        let slot = Arc::new(Mutex::new(None::<AnyDisposable>));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let self_slot = Arc::clone(&slot);
        let record = Arc::clone(&seen);
        let subscription = signal.observe(Observer::new(move |event: TestEvent| {
            record.lock().unwrap().push(event);
            if let Some(subscription) = self_slot.lock().unwrap().as_ref() {
                subscription.dispose();
            }
        }));
        *slot.lock().unwrap() = Some(subscription);

        sink.send_value(1);
        sink.send_value(2);

        assert_eq!(*seen.lock().unwrap(), vec![Event::Value(1)]);
    }

    #[test]
    fn terminal_racing_an_in_flight_value_lands_after_it() {
        let (sink, signal) = Signal::<i32, &'static str>::pipe();

        let (parked_tx, parked_rx) = channel();
        let (release_tx, release_rx) = channel::<()>();
        let release_rx = Mutex::new(release_rx);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let _sub = signal.observe(Observer::new(move |event: TestEvent| {
            let is_value = !event.is_terminating();
            record.lock().unwrap().push(event);

            // Park the first value mid-delivery until the test releases it.
            if is_value {
                parked_tx.send(()).unwrap();
                release_rx.lock().unwrap().recv().unwrap();
            }
        }));

        let value_pusher = {
            let sink = sink.clone();
            thread::spawn(move || sink.send_value(1))
        };
        parked_rx.recv().unwrap();

        // With the value parked inside the observer, a terminal push must
        // neither block on the pass in flight nor overtake it.
        let completer = {
            let sink = sink.clone();
            thread::spawn(move || sink.send_completed())
        };
        completer.join().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Event::Value(1)]);

        release_tx.send(()).unwrap();
        value_pusher.join().unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Event::Value(1), Event::Completed]
        );
    }

    #[test]
    fn observer_may_complete_the_signal_from_its_own_callback() {
        let (sink, signal) = Signal::<i32, &'static str>::pipe();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let reentrant_sink = sink.clone();
        let _sub = signal.observe(Observer::new(move |event: TestEvent| {
            record.lock().unwrap().push(event);
            reentrant_sink.send_completed();
        }));

        sink.send_value(1);
        sink.send_value(2);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Event::Value(1), Event::Completed]
        );
    }

    #[test]
    fn observer_callbacks_run_without_internal_locks_held() {
        // Subscribing from within a callback would deadlock if the observer
        // bag lock were held during delivery.
        let (sink, signal) = Signal::<i32, &'static str>::pipe();

        let late_seen = Arc::new(Mutex::new(Vec::new()));
        let inner_signal = signal.clone();
        let inner_seen = Arc::clone(&late_seen);

        let _sub = signal.observe(Observer::values(move |value| {
            if value == 1 {
                let record = Arc::clone(&inner_seen);
                drop(inner_signal.observe(Observer::values(move |value| {
                    record.lock().unwrap().push(value);
                })));
            }
        }));

        sink.send_value(1);
        sink.send_value(2);

        assert_eq!(*late_seen.lock().unwrap(), vec![2]);
    }
}
