//! Keyboard input queue shared by the drain task and the execution task.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::CancelToken;

/// How a wait for input ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputWait {
    /// At least one character is queued.
    Ready,
    /// The cancellation signal fired first.
    Cancelled,
    /// The queue is empty and its source is gone.
    Closed,
}

#[derive(Debug, Default)]
struct Pending {
    chars: VecDeque<u16>,
    closed: bool,
}

/// FIFO of received characters with a wake-up signal for blocked readers.
///
/// Characters stay queued until consumed by `GETC` or acknowledged after a
/// program read of `KBDR`; the front element is what the latch exposes.
/// Once closed, no further characters are expected, but queued ones remain
/// readable.
#[derive(Debug, Default)]
pub struct InputQueue {
    pending: Mutex<Pending>,
    ready: Condvar,
}

impl InputQueue {
    /// Creates an empty, open queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `ch` and wakes one waiting reader.
    pub fn push(&self, ch: u16) {
        self.lock().chars.push_back(ch);
        self.ready.notify_one();
    }

    /// Returns the oldest character without removing it.
    #[must_use]
    pub fn front(&self) -> Option<u16> {
        self.lock().chars.front().copied()
    }

    /// Removes and returns the oldest character.
    pub fn pop(&self) -> Option<u16> {
        self.lock().chars.pop_front()
    }

    /// Number of queued characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().chars.len()
    }

    /// Returns `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().chars.is_empty()
    }

    /// Marks the source as gone and wakes every waiting reader.
    pub fn close(&self) {
        self.set_closed(true);
    }

    /// Sets whether more characters can still arrive.
    pub fn set_closed(&self, closed: bool) {
        self.lock().closed = closed;
        self.ready.notify_all();
    }

    /// Wakes every blocked reader so it can re-check cancellation.
    pub fn wake_all(&self) {
        self.ready.notify_all();
    }

    /// Blocks until a character is queued, the queue is closed and empty, or
    /// `cancel` fires. Nothing is dequeued.
    ///
    /// Cancellation is re-checked at least once per `tick`.
    pub fn wait_for_input(&self, cancel: &CancelToken, tick: Duration) -> InputWait {
        let mut pending = self.lock();
        loop {
            if cancel.is_cancelled() {
                return InputWait::Cancelled;
            }
            if !pending.chars.is_empty() {
                return InputWait::Ready;
            }
            if pending.closed {
                return InputWait::Closed;
            }
            pending = self
                .ready
                .wait_timeout(pending, tick)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}
