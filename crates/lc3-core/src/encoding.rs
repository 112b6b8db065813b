/// Primary opcodes (`OP` field, bits 15..12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Opcode {
    Br = 0x0,
    Add = 0x1,
    Ld = 0x2,
    St = 0x3,
    Jsr = 0x4,
    And = 0x5,
    Ldr = 0x6,
    Str = 0x7,
    Rti = 0x8,
    Not = 0x9,
    Ldi = 0xA,
    Sti = 0xB,
    Jmp = 0xC,
    Res = 0xD,
    Lea = 0xE,
    Trap = 0xF,
}

impl Opcode {
    /// Extracts the opcode from the top four bits of an instruction word.
    #[must_use]
    pub const fn from_word(word: u16) -> Self {
        match word >> 12 {
            0x0 => Self::Br,
            0x1 => Self::Add,
            0x2 => Self::Ld,
            0x3 => Self::St,
            0x4 => Self::Jsr,
            0x5 => Self::And,
            0x6 => Self::Ldr,
            0x7 => Self::Str,
            0x8 => Self::Rti,
            0x9 => Self::Not,
            0xA => Self::Ldi,
            0xB => Self::Sti,
            0xC => Self::Jmp,
            0xD => Self::Res,
            0xE => Self::Lea,
            _ => Self::Trap,
        }
    }

    /// Returns the opcode placed in bits 15..12 of an otherwise empty word.
    #[must_use]
    pub const fn bits(self) -> u16 {
        (self as u16) << 12
    }
}

/// Trap vectors with a service routine (low byte of a `TRAP` instruction).
///
/// `IN` (`0x23`) and `PUTSP` (`0x24`) have no routine and decode as
/// unimplemented traps, like every other vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TrapVector {
    /// Read one character into `R0` without echo.
    Getc = 0x20,
    /// Write the character in `R0`.
    Out = 0x21,
    /// Write the zero-terminated word string at `R0`.
    Puts = 0x22,
    /// Stop the machine.
    Halt = 0x25,
}

impl TrapVector {
    /// Classifies the low byte of a `TRAP` word.
    #[must_use]
    pub const fn from_word(word: u16) -> Option<Self> {
        match word & 0x00FF {
            0x20 => Some(Self::Getc),
            0x21 => Some(Self::Out),
            0x22 => Some(Self::Puts),
            0x25 => Some(Self::Halt),
            _ => None,
        }
    }

    /// Full `TRAP` instruction word for this vector.
    #[must_use]
    pub const fn instruction(self) -> u16 {
        Opcode::Trap.bits() | self as u16
    }
}

#[cfg(test)]
mod tests {
    use super::{Opcode, TrapVector};

    #[test]
    fn opcode_decode_covers_all_sixteen_values() {
        for op in 0_u16..16 {
            let opcode = Opcode::from_word(op << 12);
            assert_eq!(opcode.bits(), op << 12);
        }
    }

    #[test]
    fn opcode_ignores_operand_bits() {
        assert_eq!(Opcode::from_word(0x1FFF), Opcode::Add);
        assert_eq!(Opcode::from_word(0xF025), Opcode::Trap);
        assert_eq!(Opcode::from_word(0x0000), Opcode::Br);
    }

    #[test]
    fn trap_vectors_use_low_byte_only() {
        assert_eq!(TrapVector::from_word(0xF020), Some(TrapVector::Getc));
        assert_eq!(TrapVector::from_word(0xFF25), Some(TrapVector::Halt));
        assert_eq!(TrapVector::from_word(0xF200), None);
        assert_eq!(TrapVector::from_word(0xF026), None);
        assert_eq!(TrapVector::from_word(0xF023), None);
        assert_eq!(TrapVector::from_word(0xF024), None);
    }

    #[test]
    fn trap_instruction_words_match_conventional_encodings() {
        assert_eq!(TrapVector::Getc.instruction(), 0xF020);
        assert_eq!(TrapVector::Out.instruction(), 0xF021);
        assert_eq!(TrapVector::Puts.instruction(), 0xF022);
        assert_eq!(TrapVector::Halt.instruction(), 0xF025);
    }
}
