use std::fmt;
use std::sync::Arc;

use crate::Event;

/// A callback that receives the events of one subscription.
///
/// Observers are plain callback values: they hold no reference back to the
/// signal they are registered with, so a signal and its observers never form
/// a reference cycle. Cloning an observer clones the handle, not the
/// callback.
///
/// # Example
///
/// ```rust
/// use signals::{Event, Observer};
///
/// let observer = Observer::<i32, String>::new(|event| match event {
///     Event::Value(value) => println!("value: {value}"),
///     Event::Failed(failure) => println!("failed: {failure}"),
///     Event::Completed => println!("completed"),
///     Event::Interrupted => println!("interrupted"),
/// });
///
/// observer.send(Event::Value(1));
/// observer.send(Event::Completed);
/// ```
pub struct Observer<V, F> {
    on_event: Arc<dyn Fn(Event<V, F>) + Send + Sync>,
}

impl<V, F> Observer<V, F> {
    /// Creates an observer from a single callback that receives every event.
    #[must_use]
    pub fn new(on_event: impl Fn(Event<V, F>) + Send + Sync + 'static) -> Self {
        Self {
            on_event: Arc::new(on_event),
        }
    }

    /// Creates an observer that only cares about values; terminal events are
    /// ignored.
    #[must_use]
    pub fn values(on_value: impl Fn(V) + Send + Sync + 'static) -> Self {
        Self::new(move |event| {
            if let Event::Value(value) = event {
                on_value(value);
            }
        })
    }

    /// Delivers `event` to the callback.
    pub fn send(&self, event: Event<V, F>) {
        (self.on_event)(event);
    }
}

impl<V, F> Clone for Observer<V, F> {
    fn clone(&self) -> Self {
        Self {
            on_event: Arc::clone(&self.on_event),
        }
    }
}

impl<V, F> fmt::Debug for Observer<V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Observer<i32, String>: Send, Sync);

    #[test]
    fn send_invokes_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_side = Arc::clone(&seen);

        let observer = Observer::<i32, String>::new(move |event| {
            sink_side.lock().unwrap().push(event);
        });

        observer.send(Event::Value(1));
        observer.send(Event::Completed);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Event::Value(1), Event::Completed]
        );
    }

    #[test]
    fn values_observer_ignores_terminal_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_side = Arc::clone(&seen);

        let observer = Observer::<i32, String>::values(move |value| {
            sink_side.lock().unwrap().push(value);
        });

        observer.send(Event::Value(1));
        observer.send(Event::Completed);
        observer.send(Event::Value(2));

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn clones_share_the_callback() {
        let seen = Arc::new(Mutex::new(0));
        let sink_side = Arc::clone(&seen);

        let observer = Observer::<i32, String>::values(move |_| {
            *sink_side.lock().unwrap() += 1;
        });

        observer.clone().send(Event::Value(1));
        observer.send(Event::Value(2));

        assert_eq!(*seen.lock().unwrap(), 2);
    }
}
