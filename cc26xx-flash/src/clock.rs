use std::time::{Duration, Instant};

/// A monotonic time source.
///
/// The flash engine measures its timeouts through this trait, so tests can
/// replace the wall clock with a simulated one.
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed point in the past.
    fn now(&self) -> Duration;
}

/// [`Clock`] backed by [`std::time::Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Liveness signal towards the debugger session.
///
/// Long running flash operations call this handler periodically, so that a
/// supervisor watching the session does not consider it hung.
///
/// # Example
///
/// ```
/// use cc26xx_flash::KeepAlive;
///
/// let keep_alive = KeepAlive::new(|| println!("still flashing"));
/// ```
pub struct KeepAlive {
    handler: Box<dyn Fn()>,
}

impl KeepAlive {
    /// Create a new `KeepAlive` calling `handler` on every heartbeat.
    pub fn new(handler: impl Fn() + 'static) -> Self {
        Self {
            handler: Box::new(handler),
        }
    }

    /// A `KeepAlive` which does nothing.
    pub fn empty() -> Self {
        Self::new(|| {})
    }

    pub(crate) fn signal(&self) {
        (self.handler)();
    }
}

impl Default for KeepAlive {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for KeepAlive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeepAlive").finish_non_exhaustive()
    }
}
