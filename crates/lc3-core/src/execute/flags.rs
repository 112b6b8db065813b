//! Condition-flag updates for result-producing instructions.

use crate::state::{CoreState, GeneralRegister};

/// Writes a result register and recomputes `COND` from the written value.
///
/// Every instruction that defines a destination register goes through here,
/// which keeps `COND` at exactly one of P/Z/N afterwards.
pub fn write_result(core: &mut CoreState, dr: GeneralRegister, value: u16) {
    core.regs.set_gpr_with_flags(dr, value);
}

#[cfg(test)]
mod tests {
    use super::write_result;
    use crate::state::{CoreState, GeneralRegister, FLAG_NEGATIVE, FLAG_POSITIVE, FLAG_ZERO};

    #[test]
    fn result_write_selects_single_flag() {
        let mut core = CoreState::default();

        write_result(&mut core, GeneralRegister::R1, 35);
        assert_eq!(core.regs.cond(), FLAG_POSITIVE);

        write_result(&mut core, GeneralRegister::R1, 0);
        assert_eq!(core.regs.cond(), FLAG_ZERO);

        write_result(&mut core, GeneralRegister::R1, 0xFFF6);
        assert_eq!(core.regs.cond(), FLAG_NEGATIVE);
        assert_eq!(core.regs.gpr(GeneralRegister::R1), 0xFFF6);
    }
}
