use std::fmt;
use std::rc::Rc;

/// A value derived from the frame time, recomputed on every access.
///
/// Used for quantities that change every frame (an orbiting light), where
/// caching across frames would be wrong. Handles are cheap to clone so other
/// producers can read them.
pub struct TimeSensitive<T, S = ()> {
    producer: Rc<dyn Fn(&S, f64) -> T>,
}

impl<T, S> TimeSensitive<T, S> {
    pub fn new(producer: impl Fn(&S, f64) -> T + 'static) -> Self {
        Self {
            producer: Rc::new(producer),
        }
    }

    /// Evaluate the producer at `time` (milliseconds on the frame clock).
    pub fn get_at(&self, state: &S, time: f64) -> T {
        (self.producer)(state, time)
    }
}

impl<T, S> Clone for TimeSensitive<T, S> {
    fn clone(&self) -> Self {
        Self {
            producer: self.producer.clone(),
        }
    }
}

impl<T, S> fmt::Debug for TimeSensitive<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeSensitive").finish_non_exhaustive()
    }
}
