//! Cancellable hand-off over a rendezvous channel.

use std::sync::mpsc::{SyncSender, TrySendError};
use std::time::Duration;

use super::{Backoff, CancelToken};

/// Why [`send_char`] gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendAbort {
    /// The cancellation signal fired first.
    Cancelled,
    /// The receiving side was dropped.
    Disconnected,
}

/// Offers `ch` on `sink` until a receiver takes it.
///
/// Retries with exponential backoff capped at `tick` and gives up as soon as
/// `cancel` fires.
///
/// # Errors
///
/// Returns [`SendAbort`] when cancelled or when the receiver is gone.
pub fn send_char(
    sink: &SyncSender<char>,
    ch: char,
    cancel: &CancelToken,
    tick: Duration,
) -> Result<(), SendAbort> {
    let mut backoff = Backoff::new(tick);
    loop {
        if cancel.is_cancelled() {
            return Err(SendAbort::Cancelled);
        }
        match sink.try_send(ch) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Disconnected(_)) => return Err(SendAbort::Disconnected),
            Err(TrySendError::Full(_)) => {
                if backoff.snooze(cancel) {
                    return Err(SendAbort::Cancelled);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{send_char, SendAbort};
    use crate::io::CancelToken;
    use std::sync::mpsc::sync_channel;
    use std::thread;
    use std::time::Duration;

    const TICK: Duration = Duration::from_millis(1);

    #[test]
    fn delivers_to_waiting_receiver() {
        let (tx, rx) = sync_channel(0);
        let cancel = CancelToken::new();
        thread::scope(|scope| {
            let reader = scope.spawn(move || rx.recv().expect("one char"));
            send_char(&tx, 'h', &cancel, TICK).expect("delivered");
            assert_eq!(reader.join().expect("reader"), 'h');
        });
    }

    #[test]
    fn gives_up_when_cancelled_without_receiver() {
        let (tx, _rx) = sync_channel(0);
        let cancel = CancelToken::new();
        thread::scope(|scope| {
            scope.spawn(|| {
                thread::sleep(Duration::from_millis(5));
                cancel.cancel();
            });
            assert_eq!(send_char(&tx, 'h', &cancel, TICK), Err(SendAbort::Cancelled));
        });
    }

    #[test]
    fn reports_dropped_receiver() {
        let (tx, rx) = sync_channel::<char>(0);
        drop(rx);
        assert_eq!(
            send_char(&tx, 'h', &CancelToken::new(), TICK),
            Err(SendAbort::Disconnected)
        );
    }
}
