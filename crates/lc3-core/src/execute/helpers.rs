//! Operand and effective-address helpers for instruction execution.

use crate::decoder::Operand;
use crate::state::{CoreState, GeneralRegister};

/// Resolves the second `ADD`/`AND` operand.
#[must_use]
pub const fn operand_value(core: &CoreState, operand: Operand) -> u16 {
    match operand {
        Operand::Register(reg) => core.regs.gpr(reg),
        Operand::Immediate(imm) => imm,
    }
}

/// `next_pc + offset`, wrapping modulo 64 Ki.
#[must_use]
pub const fn pc_relative(next_pc: u16, offset: u16) -> u16 {
    next_pc.wrapping_add(offset)
}

/// `base + offset`, wrapping modulo 64 Ki.
#[must_use]
pub const fn base_relative(core: &CoreState, base: GeneralRegister, offset: u16) -> u16 {
    core.regs.gpr(base).wrapping_add(offset)
}

#[cfg(test)]
mod tests {
    use super::{base_relative, operand_value, pc_relative};
    use crate::decoder::Operand;
    use crate::state::{CoreState, GeneralRegister};

    #[test]
    fn address_arithmetic_wraps() {
        assert_eq!(pc_relative(0xFFFF, 0x0002), 0x0001);
        assert_eq!(pc_relative(0x0000, 0xFFFF), 0xFFFF);

        let mut core = CoreState::default();
        core.regs.set_gpr(GeneralRegister::R6, 0xFFFE);
        assert_eq!(base_relative(&core, GeneralRegister::R6, 0x0003), 0x0001);
        assert_eq!(base_relative(&core, GeneralRegister::R6, 0xFFE0), 0xFFDE);
    }

    #[test]
    fn operand_reads_register_or_immediate() {
        let mut core = CoreState::default();
        core.regs.set_gpr(GeneralRegister::R3, 0x00AA);
        assert_eq!(operand_value(&core, Operand::Register(GeneralRegister::R3)), 0x00AA);
        assert_eq!(operand_value(&core, Operand::Immediate(0xFFF0)), 0xFFF0);
    }
}
