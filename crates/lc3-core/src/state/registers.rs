/// Number of architecturally visible general-purpose registers (`R0..R7`).
pub const GENERAL_REGISTER_COUNT: usize = 8;
/// Number of register-file slots: `R0..R7`, `PC`, and `COND`.
pub const REGISTER_COUNT: usize = 10;
/// `COND` value after a positive result.
pub const FLAG_POSITIVE: u16 = 1 << 0;
/// `COND` value after a zero result.
pub const FLAG_ZERO: u16 = 1 << 1;
/// `COND` value after a negative result.
pub const FLAG_NEGATIVE: u16 = 1 << 2;

/// 3-bit general-purpose register field as encoded in an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum GeneralRegister {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
}

impl GeneralRegister {
    /// Ordered list of all general-purpose registers.
    pub const ALL: [Self; GENERAL_REGISTER_COUNT] = [
        Self::R0,
        Self::R1,
        Self::R2,
        Self::R3,
        Self::R4,
        Self::R5,
        Self::R6,
        Self::R7,
    ];

    /// Returns the register-file index for this register (`0..=7`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Extracts the 3-bit register field starting at bit `shift` of `word`.
    #[must_use]
    pub const fn from_field(word: u16, shift: u32) -> Self {
        match (word >> shift) & 0x7 {
            0 => Self::R0,
            1 => Self::R1,
            2 => Self::R2,
            3 => Self::R3,
            4 => Self::R4,
            5 => Self::R5,
            6 => Self::R6,
            _ => Self::R7,
        }
    }
}

/// Any slot of the register file, in register-file index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Register {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
    /// Program counter.
    Pc = 8,
    /// Condition flags.
    Cond = 9,
}

impl Register {
    /// Returns the register-file index (`0..=9`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Maps a raw register-file index back to a register.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::R0),
            1 => Some(Self::R1),
            2 => Some(Self::R2),
            3 => Some(Self::R3),
            4 => Some(Self::R4),
            5 => Some(Self::R5),
            6 => Some(Self::R6),
            7 => Some(Self::R7),
            8 => Some(Self::Pc),
            9 => Some(Self::Cond),
            _ => None,
        }
    }
}

impl From<GeneralRegister> for Register {
    fn from(reg: GeneralRegister) -> Self {
        match reg {
            GeneralRegister::R0 => Self::R0,
            GeneralRegister::R1 => Self::R1,
            GeneralRegister::R2 => Self::R2,
            GeneralRegister::R3 => Self::R3,
            GeneralRegister::R4 => Self::R4,
            GeneralRegister::R5 => Self::R5,
            GeneralRegister::R6 => Self::R6,
            GeneralRegister::R7 => Self::R7,
        }
    }
}

/// Classifies a result value into exactly one condition flag.
#[must_use]
pub const fn condition_for(value: u16) -> u16 {
    if value == 0 {
        FLAG_ZERO
    } else if value & 0x8000 != 0 {
        FLAG_NEGATIVE
    } else {
        FLAG_POSITIVE
    }
}

/// Ten-slot register file: `R0..R7`, `PC`, `COND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    slots: [u16; REGISTER_COUNT],
}

impl RegisterFile {
    /// Builds a register file from raw slot values in index order.
    #[must_use]
    pub const fn from_slots(slots: [u16; REGISTER_COUNT]) -> Self {
        Self { slots }
    }

    /// Reads any register-file slot.
    #[must_use]
    pub const fn get(&self, reg: Register) -> u16 {
        self.slots[reg.index()]
    }

    /// Reads a general-purpose register.
    #[must_use]
    pub const fn gpr(&self, reg: GeneralRegister) -> u16 {
        self.slots[reg.index()]
    }

    /// Writes a general-purpose register and recomputes `COND` from the value.
    pub const fn set_gpr_with_flags(&mut self, reg: GeneralRegister, value: u16) {
        self.slots[reg.index()] = value;
        self.slots[Register::Cond.index()] = condition_for(value);
    }

    /// Writes a general-purpose register, leaving `COND` alone.
    pub const fn set_gpr(&mut self, reg: GeneralRegister, value: u16) {
        self.slots[reg.index()] = value;
    }

    /// Reads the `PC` register.
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.slots[Register::Pc.index()]
    }

    /// Writes the `PC` register.
    pub const fn set_pc(&mut self, value: u16) {
        self.slots[Register::Pc.index()] = value;
    }

    /// Reads the `COND` register.
    #[must_use]
    pub const fn cond(&self) -> u16 {
        self.slots[Register::Cond.index()]
    }

    /// Writes the `COND` register.
    pub const fn set_cond(&mut self, value: u16) {
        self.slots[Register::Cond.index()] = value;
    }
}
