//! Core [`Event`] struct and implementations.

use std::time::SystemTime;

/// Arbitrary event paired with the time it has happened at.
///
/// The relay never re-samples the clock: whatever a handler reports to the
/// remote service as a start or finish time is the [`Event::at`] of the
/// event that triggered it.
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct Event<T: ?Sized> {
    /// [`SystemTime`] when this [`Event`] has happened.
    pub at: SystemTime,

    /// Actual value of this [`Event`].
    pub value: T,
}

impl<T> Event<T> {
    /// Creates a new [`Event`] out of the given `value`, happening now.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self { at: SystemTime::now(), value }
    }

    /// Creates a new [`Event`] out of the given `value`, happening `at` the
    /// given time.
    #[must_use]
    pub const fn at(value: T, at: SystemTime) -> Self {
        Self { at, value }
    }

    /// Unwraps the inner [`Event::value`] loosing all the attached metadata.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Splits this [`Event`] to the inner [`Event::value`] and its detached
    /// metadata.
    #[must_use]
    pub fn split(self) -> (T, Metadata) {
        self.replace(())
    }

    /// Maps the inner [`Event::value`] with the given function.
    #[must_use]
    pub fn map<V>(self, f: impl FnOnce(T) -> V) -> Event<V> {
        let (val, meta) = self.split();
        meta.wrap(f(val))
    }

    /// Replaces the inner [`Event::value`] with the given one, returning the
    /// old one along.
    #[must_use]
    pub fn replace<V>(self, value: V) -> (T, Event<V>) {
        let event = Event { at: self.at, value };
        (self.value, event)
    }
}

/// Shortcut for a detached metadata of an arbitrary [`Event`].
pub type Metadata = Event<()>;

impl Metadata {
    /// Wraps the given `value` with this [`Event`] metadata.
    #[must_use]
    pub fn wrap<V>(self, value: V) -> Event<V> {
        self.replace(value).1
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::Event;

    #[test]
    fn preserves_time_across_map() {
        let at = SystemTime::UNIX_EPOCH + Duration::from_secs(42);
        let ev = Event::at(1_u8, at).map(|n| n + 1);

        assert_eq!(ev.at, at);
        assert_eq!(ev.value, 2);
    }
}
