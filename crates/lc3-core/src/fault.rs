use thiserror::Error;

use crate::encoding::Opcode;

/// Recoverable decode failures reported by `Step`.
///
/// Both variants are raised before any state is touched, so the faulting
/// instruction behaves as a no-op (the program counter is not advanced).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StepError {
    /// The opcode is reserved (`RES`) or privileged (`RTI`).
    #[error("op code '{word:#x}' is not implemented")]
    UnimplementedOpcode {
        /// Full instruction word.
        word: u16,
    },
    /// The `TRAP` vector has no service routine.
    #[error("trap code '{word:#06x}' is not implemented")]
    UnimplementedTrap {
        /// Full instruction word.
        word: u16,
    },
}

impl StepError {
    /// The instruction word that failed to decode.
    #[must_use]
    pub const fn word(self) -> u16 {
        match self {
            Self::UnimplementedOpcode { word } | Self::UnimplementedTrap { word } => word,
        }
    }

    /// The opcode of the failing word.
    #[must_use]
    pub const fn opcode(self) -> Opcode {
        Opcode::from_word(self.word())
    }
}
