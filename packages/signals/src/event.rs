/// One occurrence in the life of a signal: a value, or one of the three
/// terminal markers.
///
/// Per signal, the emission grammar is `Value* (Failed | Completed |
/// Interrupted)?` - zero or more values followed by at most one terminal
/// event, which is always the last event any observer receives.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event<V, F> {
    /// A value produced by the signal.
    Value(V),

    /// The signal failed. No further events follow.
    Failed(F),

    /// The signal finished normally. No further events follow.
    Completed,

    /// Event production was cancelled before the signal could finish or
    /// fail. No further events follow.
    Interrupted,
}

impl<V, F> Event<V, F> {
    /// Whether this event ends the signal.
    ///
    /// True for everything except [`Value`][Self::Value].
    #[must_use]
    pub fn is_terminating(&self) -> bool {
        !matches!(self, Self::Value(_))
    }

    /// The contained value, if this is a [`Value`][Self::Value] event.
    #[must_use]
    pub fn value(&self) -> Option<&V> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The contained failure, if this is a [`Failed`][Self::Failed] event.
    #[must_use]
    pub fn failure(&self) -> Option<&F> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Consumes the event, returning the value if there is one.
    #[must_use]
    pub fn into_value(self) -> Option<V> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}
