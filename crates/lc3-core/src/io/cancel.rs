//! Cancellation signal and bounded retry backoff.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Cloneable, idempotent cancellation signal.
///
/// Firing it wakes every thread parked in [`CancelToken::wait`] or
/// [`CancelToken::wait_timeout`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    /// Creates an unfired token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self) -> MutexGuard<'_, bool> {
        self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fires the signal. Returns `true` only for the call that fired it.
    pub fn cancel(&self) -> bool {
        let mut fired = self.flag();
        if *fired {
            return false;
        }
        *fired = true;
        self.inner.1.notify_all();
        true
    }

    /// Returns `true` once the signal has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.flag()
    }

    /// Blocks until the signal fires.
    pub fn wait(&self) {
        let mut fired = self.flag();
        while !*fired {
            fired = self
                .inner
                .1
                .wait(fired)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Blocks for at most `timeout`. Returns `true` if the signal fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut fired = self.flag();
        while !*fired {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            fired = self
                .inner
                .1
                .wait_timeout(fired, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}

/// Exponential retry delay starting at 1 µs and capped at one tick.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    cap: Duration,
}

impl Backoff {
    const START: Duration = Duration::from_micros(1);

    /// Creates a backoff whose delay never exceeds `cap`.
    #[must_use]
    pub fn new(cap: Duration) -> Self {
        Self {
            next: Self::START.min(cap),
            cap,
        }
    }

    /// Returns the current delay and doubles the next one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.cap);
        delay
    }

    /// Sleeps for the next delay, waking early on cancellation.
    ///
    /// Returns `true` if `cancel` fired.
    pub fn snooze(&mut self, cancel: &CancelToken) -> bool {
        cancel.wait_timeout(self.next_delay())
    }
}
