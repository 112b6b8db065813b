//! Instruction decoder for the LC-3 ISA.
//!
//! Decoding extracts every operand field and rejects unimplemented opcodes
//! and trap vectors up front, so execution of a decoded instruction can no
//! longer fail.

use crate::encoding::{Opcode, TrapVector};
use crate::fault::StepError;
use crate::state::GeneralRegister;

/// Widens the low `bits` bits of `value` as a two's-complement number.
///
/// Bits above the field are ignored on input. `bits` must be in `1..=15`.
#[must_use]
pub const fn sign_extend(value: u16, bits: u32) -> u16 {
    debug_assert!(matches!(bits, 1..=15), "field width out of range");
    let field = value & (u16::MAX >> (16 - bits));
    if (field >> (bits - 1)) & 1 == 1 {
        field | (u16::MAX << bits)
    } else {
        field
    }
}

/// Second operand of `ADD`/`AND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    /// Source register (`SR2`).
    Register(GeneralRegister),
    /// Sign-extended 5-bit immediate.
    Immediate(u16),
}

/// Target selection of `JSR`/`JSRR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpTarget {
    /// `JSR`: sign-extended 11-bit PC offset.
    PcOffset(u16),
    /// `JSRR`: address held in a base register.
    Register(GeneralRegister),
}

/// Decoded instruction with all operand fields extracted.
///
/// Offsets are already sign-extended to 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Instruction {
    Br { nzp: u16, offset: u16 },
    Add {
        dr: GeneralRegister,
        sr1: GeneralRegister,
        operand: Operand,
    },
    And {
        dr: GeneralRegister,
        sr1: GeneralRegister,
        operand: Operand,
    },
    Not {
        dr: GeneralRegister,
        sr: GeneralRegister,
    },
    Jmp { base: GeneralRegister },
    Jsr { target: JumpTarget },
    Ld {
        dr: GeneralRegister,
        offset: u16,
    },
    Ldi {
        dr: GeneralRegister,
        offset: u16,
    },
    Ldr {
        dr: GeneralRegister,
        base: GeneralRegister,
        offset: u16,
    },
    Lea {
        dr: GeneralRegister,
        offset: u16,
    },
    St {
        sr: GeneralRegister,
        offset: u16,
    },
    Sti {
        sr: GeneralRegister,
        offset: u16,
    },
    Str {
        sr: GeneralRegister,
        base: GeneralRegister,
        offset: u16,
    },
    Trap { vector: TrapVector },
}

impl Instruction {
    /// Opcode this instruction was decoded from.
    #[must_use]
    pub const fn opcode(self) -> Opcode {
        match self {
            Self::Br { .. } => Opcode::Br,
            Self::Add { .. } => Opcode::Add,
            Self::And { .. } => Opcode::And,
            Self::Not { .. } => Opcode::Not,
            Self::Jmp { .. } => Opcode::Jmp,
            Self::Jsr { .. } => Opcode::Jsr,
            Self::Ld { .. } => Opcode::Ld,
            Self::Ldi { .. } => Opcode::Ldi,
            Self::Ldr { .. } => Opcode::Ldr,
            Self::Lea { .. } => Opcode::Lea,
            Self::St { .. } => Opcode::St,
            Self::Sti { .. } => Opcode::Sti,
            Self::Str { .. } => Opcode::Str,
            Self::Trap { .. } => Opcode::Trap,
        }
    }
}

/// Instruction decoder for the LC-3 ISA.
pub struct Decoder;

const fn dr(word: u16) -> GeneralRegister {
    GeneralRegister::from_field(word, 9)
}

const fn sr1(word: u16) -> GeneralRegister {
    GeneralRegister::from_field(word, 6)
}

const fn operand(word: u16) -> Operand {
    if word & 0x0020 != 0 {
        Operand::Immediate(sign_extend(word, 5))
    } else {
        Operand::Register(GeneralRegister::from_field(word, 0))
    }
}

impl Decoder {
    /// Decodes a 16-bit instruction word.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::UnimplementedOpcode`] for `RTI`/`RES` and
    /// [`StepError::UnimplementedTrap`] for a `TRAP` vector without a
    /// service routine.
    pub const fn decode(word: u16) -> Result<Instruction, StepError> {
        let instruction = match Opcode::from_word(word) {
            Opcode::Br => Instruction::Br {
                nzp: (word >> 9) & 0x7,
                offset: sign_extend(word, 9),
            },
            Opcode::Add => Instruction::Add {
                dr: dr(word),
                sr1: sr1(word),
                operand: operand(word),
            },
            Opcode::And => Instruction::And {
                dr: dr(word),
                sr1: sr1(word),
                operand: operand(word),
            },
            Opcode::Not => Instruction::Not {
                dr: dr(word),
                sr: sr1(word),
            },
            Opcode::Jmp => Instruction::Jmp { base: sr1(word) },
            Opcode::Jsr => Instruction::Jsr {
                target: if word & 0x0800 != 0 {
                    JumpTarget::PcOffset(sign_extend(word, 11))
                } else {
                    JumpTarget::Register(sr1(word))
                },
            },
            Opcode::Ld => Instruction::Ld {
                dr: dr(word),
                offset: sign_extend(word, 9),
            },
            Opcode::Ldi => Instruction::Ldi {
                dr: dr(word),
                offset: sign_extend(word, 9),
            },
            Opcode::Ldr => Instruction::Ldr {
                dr: dr(word),
                base: sr1(word),
                offset: sign_extend(word, 6),
            },
            Opcode::Lea => Instruction::Lea {
                dr: dr(word),
                offset: sign_extend(word, 9),
            },
            Opcode::St => Instruction::St {
                sr: dr(word),
                offset: sign_extend(word, 9),
            },
            Opcode::Sti => Instruction::Sti {
                sr: dr(word),
                offset: sign_extend(word, 9),
            },
            Opcode::Str => Instruction::Str {
                sr: dr(word),
                base: sr1(word),
                offset: sign_extend(word, 6),
            },
            Opcode::Trap => match TrapVector::from_word(word) {
                Some(vector) => Instruction::Trap { vector },
                None => return Err(StepError::UnimplementedTrap { word }),
            },
            Opcode::Rti | Opcode::Res => return Err(StepError::UnimplementedOpcode { word }),
        };
        Ok(instruction)
    }
}
