//! Public host-facing API contracts for embedding the engine.

use std::time::Duration;

use crate::fault::StepError;

/// Default granularity of every cancellable wait, in microseconds.
pub const DEFAULT_TICK_INTERVAL_US: u64 = 1_000;

/// What the run loop does when `Step` reports an unimplemented opcode or trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StepErrorPolicy {
    /// Stop the machine and report the error in [`RunOutcome`].
    #[default]
    Halt,
    /// Log the error, skip the offending word, and keep running.
    Continue,
}

/// Top-level configuration for a machine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MachineConfig {
    /// Poll/backoff interval for waits outside `start` (direct `step` calls).
    pub tick_interval_us: u64,
    /// Run-loop reaction to a failing `Step`.
    pub on_step_error: StepErrorPolicy,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            tick_interval_us: DEFAULT_TICK_INTERVAL_US,
            on_step_error: StepErrorPolicy::Halt,
        }
    }
}

impl MachineConfig {
    /// Tick interval as a [`Duration`], never zero.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_micros(self.tick_interval_us.max(1))
    }
}

/// Character I/O contract consumed by trap execution.
///
/// The machine waits for input and hands output off before it locks the
/// core, so its implementation never blocks; tests substitute scripted stubs.
pub trait ConsoleBus {
    /// Dequeues the next input character.
    ///
    /// Returns `None` when none can be delivered; nothing is dequeued then.
    fn read_char(&mut self) -> Option<u16>;

    /// Hands one character to the output sink.
    ///
    /// Returns `false` when the hand-off was abandoned.
    fn write_char(&mut self, ch: u8) -> bool;

    /// Dequeues the character currently latched in `KBDR`.
    fn acknowledge_key(&mut self);

    /// Stops the machine (the `HALT` trap).
    fn halt(&mut self);
}

/// Result of one successful `Step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// The instruction completed and `PC` was written.
    Retired,
    /// `HALT` executed; the machine is stopped.
    Halted,
    /// Cancellation fired while a trap was blocked; no state was changed.
    Interrupted,
    /// `GETC` found the queue empty and the input source gone; no state was
    /// changed.
    InputClosed,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The program executed `HALT`.
    Halted,
    /// The cancellation signal fired.
    Cancelled,
    /// A `GETC` was pending after the input source disconnected and every
    /// queued character had been consumed.
    InputClosed,
    /// `Step` failed and the policy is [`StepErrorPolicy::Halt`].
    Faulted(StepError),
}

/// Aggregated outcome of one `Machine::start` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Number of instructions retired, including the final `HALT`.
    pub steps: u64,
    /// Why the run ended.
    pub stop_reason: StopReason,
}

#[cfg(test)]
mod tests {
    use super::{MachineConfig, StepErrorPolicy, DEFAULT_TICK_INTERVAL_US};
    use std::time::Duration;

    #[test]
    fn default_config_halts_on_step_errors() {
        let config = MachineConfig::default();
        assert_eq!(config.on_step_error, StepErrorPolicy::Halt);
        assert_eq!(config.tick_interval_us, DEFAULT_TICK_INTERVAL_US);
        assert_eq!(config.tick_interval(), Duration::from_millis(1));
    }

    #[test]
    fn zero_tick_interval_is_clamped() {
        let config = MachineConfig {
            tick_interval_us: 0,
            ..MachineConfig::default()
        };
        assert_eq!(config.tick_interval(), Duration::from_micros(1));
    }
}
