//! Host-side I/O plumbing shared by the run loop and front ends.
//!
//! Everything here blocks only in slices of one tick so a fired
//! [`CancelToken`] is observed promptly.

mod cancel;
mod handoff;
mod queue;

pub use cancel::{Backoff, CancelToken};
pub use handoff::{send_char, SendAbort};
pub use queue::{InputQueue, InputWait};
