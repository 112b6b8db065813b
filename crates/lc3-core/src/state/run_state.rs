/// Host-observable execution state of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Not executing; the initial state and the state after `HALT` or cancellation.
    #[default]
    Stopped,
    /// Inside `Machine::start`, executing instructions.
    Running,
}

impl RunState {
    /// Returns `true` while the run loop is active.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::RunState;

    #[test]
    fn run_state_default_is_stopped() {
        assert_eq!(RunState::default(), RunState::Stopped);
        assert!(!RunState::default().is_running());
        assert!(RunState::Running.is_running());
    }
}
