//! Instruction execution pipeline for the LC-3 ISA.
//!
//! One step is fetch, decode, execute:
//! 1. Fetch the word at `PC`
//! 2. Decode it; unimplemented opcodes and trap vectors fail here
//! 3. Read operands, compute the result or effective address
//! 4. Perform memory reads/writes
//! 5. Write the destination register and `COND`
//! 6. Write `PC`
//!
//! Failures are only possible in step 2, so a failing step has no side
//! effects. A trap interrupted by cancellation also leaves state untouched.

mod flags;
mod helpers;
mod trap;

pub use flags::write_result;
pub use helpers::{base_relative, operand_value, pc_relative};
pub use trap::{execute_trap, trap_output};

use tracing::trace;

use crate::api::{ConsoleBus, StepOutcome};
use crate::decoder::{Decoder, Instruction, JumpTarget};
use crate::fault::StepError;
use crate::memory::is_device_register;
use crate::state::{CoreState, GeneralRegister};

/// Executes a decoded instruction against `core`.
pub fn execute_instruction(
    instr: Instruction,
    core: &mut CoreState,
    console: &mut dyn ConsoleBus,
) -> StepOutcome {
    let next_pc = core.regs.pc().wrapping_add(1);

    let pc = match instr {
        Instruction::Br { nzp, offset } => {
            if nzp & core.regs.cond() != 0 {
                pc_relative(next_pc, offset)
            } else {
                next_pc
            }
        }
        Instruction::Add { dr, sr1, operand } => {
            let value = core.regs.gpr(sr1).wrapping_add(operand_value(core, operand));
            write_result(core, dr, value);
            next_pc
        }
        Instruction::And { dr, sr1, operand } => {
            let value = core.regs.gpr(sr1) & operand_value(core, operand);
            write_result(core, dr, value);
            next_pc
        }
        Instruction::Not { dr, sr } => {
            let value = !core.regs.gpr(sr);
            write_result(core, dr, value);
            next_pc
        }
        Instruction::Jmp { base } => core.regs.gpr(base),
        Instruction::Jsr { target } => {
            let dest = match target {
                JumpTarget::PcOffset(offset) => pc_relative(next_pc, offset),
                JumpTarget::Register(base) => core.regs.gpr(base),
            };
            core.regs.set_gpr(GeneralRegister::R7, next_pc);
            dest
        }
        Instruction::Ld { dr, offset } => {
            let value = core.load(pc_relative(next_pc, offset));
            write_result(core, dr, value);
            next_pc
        }
        Instruction::Ldi { dr, offset } => {
            let pointer = core.load(pc_relative(next_pc, offset));
            let value = core.load(pointer);
            write_result(core, dr, value);
            next_pc
        }
        Instruction::Ldr { dr, base, offset } => {
            let addr = base_relative(core, base, offset);
            let value = core.load(addr);
            write_result(core, dr, value);
            next_pc
        }
        Instruction::Lea { dr, offset } => {
            write_result(core, dr, pc_relative(next_pc, offset));
            next_pc
        }
        Instruction::St { sr, offset } => {
            let value = core.regs.gpr(sr);
            store(core, pc_relative(next_pc, offset), value);
            next_pc
        }
        Instruction::Sti { sr, offset } => {
            let pointer = core.memory.read(pc_relative(next_pc, offset));
            let value = core.regs.gpr(sr);
            store(core, pointer, value);
            next_pc
        }
        Instruction::Str { sr, base, offset } => {
            let addr = base_relative(core, base, offset);
            let value = core.regs.gpr(sr);
            store(core, addr, value);
            next_pc
        }
        Instruction::Trap { vector } => return execute_trap(vector, core, console, next_pc),
    };

    core.regs.set_pc(pc);
    StepOutcome::Retired
}

fn store(core: &mut CoreState, addr: u16, value: u16) {
    if is_device_register(addr) {
        trace!(addr, value, "program write to keyboard register");
    }
    core.memory.write(addr, value);
}

/// Fetches, decodes, and executes the instruction at `PC`.
///
/// A retired load from a latched `KBDR` acknowledges the character through
/// `console` and clears the `KBSR` ready bit.
///
/// # Errors
///
/// Returns the decode error for `RTI`, `RES`, and unknown trap vectors; the
/// core is left unchanged.
pub fn step_one(
    core: &mut CoreState,
    console: &mut dyn ConsoleBus,
) -> Result<StepOutcome, StepError> {
    let pc = core.regs.pc();
    let word = core.memory.read(pc);
    trace!(pc, word, "step");

    let instr = Decoder::decode(word)?;
    let outcome = execute_instruction(instr, core, console);

    if core.take_kbdr_read() {
        console.acknowledge_key();
        core.clear_keyboard_ready();
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{Opcode, TrapVector};
    use crate::memory::{KBDR, KBSR, KBSR_READY};
    use crate::state::{FLAG_NEGATIVE, FLAG_POSITIVE, FLAG_ZERO};
    use std::collections::VecDeque;

    #[derive(Default)]
    struct StubConsole {
        input: VecDeque<u16>,
        output: Vec<u8>,
        accept_writes: Option<usize>,
        acknowledged: usize,
        halted: bool,
    }

    impl ConsoleBus for StubConsole {
        fn read_char(&mut self) -> Option<u16> {
            self.input.pop_front()
        }

        fn write_char(&mut self, ch: u8) -> bool {
            if self.accept_writes.is_some_and(|limit| self.output.len() >= limit) {
                return false;
            }
            self.output.push(ch);
            true
        }

        fn acknowledge_key(&mut self) {
            self.acknowledged += 1;
            let _ = self.input.pop_front();
        }

        fn halt(&mut self) {
            self.halted = true;
        }
    }

    fn core_with(program: &[(u16, u16)]) -> CoreState {
        let mut core = CoreState::default();
        for &(addr, word) in program {
            core.memory.write(addr, word);
        }
        core.reset();
        core
    }

    fn step(core: &mut CoreState, console: &mut StubConsole) -> StepOutcome {
        step_one(core, console).expect("instruction decodes")
    }

    #[test]
    fn add_register_immediate_and_zero_sequence() {
        let mut core = core_with(&[(0x3000, 0x1401), (0x3001, 0x143F), (0x3002, 0x1503)]);
        core.regs.set_gpr(GeneralRegister::R0, 10);
        core.regs.set_gpr(GeneralRegister::R1, 25);
        let mut console = StubConsole::default();

        step(&mut core, &mut console);
        assert_eq!(core.regs.gpr(GeneralRegister::R2), 35);
        assert_eq!(core.regs.cond(), FLAG_POSITIVE);

        step(&mut core, &mut console);
        assert_eq!(core.regs.gpr(GeneralRegister::R2), 9);
        assert_eq!(core.regs.cond(), FLAG_POSITIVE);

        step(&mut core, &mut console);
        assert_eq!(core.regs.gpr(GeneralRegister::R2), 0);
        assert_eq!(core.regs.cond(), FLAG_ZERO);
        assert_eq!(core.regs.pc(), 0x3003);
    }

    #[test]
    fn not_sets_negative_flag() {
        let mut core = core_with(&[(0x3000, 0x943F)]);
        core.regs.set_gpr(GeneralRegister::R0, 0b111);
        step(&mut core, &mut StubConsole::default());
        assert_eq!(core.regs.gpr(GeneralRegister::R2), 0b1111_1111_1111_1000);
        assert_eq!(core.regs.cond(), FLAG_NEGATIVE);
    }

    #[test]
    fn branch_offset_wraps_around_address_space() {
        // BRnzp #-2 at 0x0000 lands on 0xFFFF.
        let mut core = core_with(&[(0x0000, 0x0FFE)]);
        core.regs.set_pc(0x0000);
        core.regs.set_cond(FLAG_ZERO);
        step(&mut core, &mut StubConsole::default());
        assert_eq!(core.regs.pc(), 0xFFFF);
    }

    #[test]
    fn jsrr_through_r7_uses_old_r7_as_target() {
        let mut core = core_with(&[(0x3000, 0x41C0)]);
        core.regs.set_gpr(GeneralRegister::R7, 0x4000);
        step(&mut core, &mut StubConsole::default());
        assert_eq!(core.regs.pc(), 0x4000);
        assert_eq!(core.regs.gpr(GeneralRegister::R7), 0x3001);
    }

    #[test]
    fn jsr_does_not_touch_flags() {
        let mut core = core_with(&[(0x3000, 0x4805)]);
        core.regs.set_cond(FLAG_NEGATIVE);
        step(&mut core, &mut StubConsole::default());
        assert_eq!(core.regs.cond(), FLAG_NEGATIVE);
        assert_eq!(core.regs.pc(), 0x3006);
    }

    #[test]
    fn ld_uses_negative_offset() {
        // LD R1, #-2 at 0x3000 reads 0x2FFF.
        let mut core = core_with(&[(0x3000, 0x23FE), (0x2FFF, 0x8001)]);
        step(&mut core, &mut StubConsole::default());
        assert_eq!(core.regs.gpr(GeneralRegister::R1), 0x8001);
        assert_eq!(core.regs.cond(), FLAG_NEGATIVE);
    }

    #[test]
    fn sti_writes_through_pointer_without_touching_flags() {
        let mut core = core_with(&[(0x3000, 0xB201), (0x3002, 0x3004)]);
        core.regs.set_gpr(GeneralRegister::R1, 0x0002);
        step(&mut core, &mut StubConsole::default());
        assert_eq!(core.memory.read(0x3004), 0x0002);
        assert_eq!(core.memory.read(0x3002), 0x3004);
        assert_eq!(core.regs.cond(), 0);
    }

    #[test]
    fn unimplemented_opcode_leaves_core_untouched() {
        let mut core = core_with(&[(0x3000, 0xD000)]);
        core.regs.set_gpr(GeneralRegister::R3, 0x1234);
        let before = core.clone();

        let err = step_one(&mut core, &mut StubConsole::default()).expect_err("RES fails");
        assert_eq!(err, StepError::UnimplementedOpcode { word: 0xD000 });
        assert_eq!(err.to_string(), "op code '0xd000' is not implemented");
        assert_eq!(core, before);
    }

    #[test]
    fn unimplemented_trap_leaves_core_untouched() {
        let mut core = core_with(&[(0x3000, Opcode::Trap.bits() | 0x0200)]);
        let before = core.clone();
        let mut console = StubConsole::default();

        let err = step_one(&mut core, &mut console).expect_err("unknown vector fails");
        assert_eq!(err.to_string(), "trap code '0xf200' is not implemented");
        assert_eq!(core, before);
        assert!(!console.halted);
    }

    #[test]
    fn getc_reads_into_r0_without_echo() {
        let mut core = core_with(&[(0x3000, TrapVector::Getc.instruction())]);
        let mut console = StubConsole {
            input: VecDeque::from([u16::from(b'a')]),
            ..StubConsole::default()
        };
        assert_eq!(step(&mut core, &mut console), StepOutcome::Retired);
        assert_eq!(core.regs.gpr(GeneralRegister::R0), u16::from(b'a'));
        assert!(console.output.is_empty());
        assert_eq!(core.regs.pc(), 0x3001);
    }

    #[test]
    fn interrupted_getc_changes_nothing() {
        let mut core = core_with(&[(0x3000, TrapVector::Getc.instruction())]);
        core.regs.set_gpr(GeneralRegister::R0, 0x7777);
        let before = core.clone();

        let outcome = step(&mut core, &mut StubConsole::default());
        assert_eq!(outcome, StepOutcome::Interrupted);
        assert_eq!(core, before);
    }

    #[test]
    fn out_sends_low_byte_of_r0() {
        let mut core = core_with(&[(0x3000, TrapVector::Out.instruction())]);
        core.regs.set_gpr(GeneralRegister::R0, 0x1241);
        let mut console = StubConsole::default();
        step(&mut core, &mut console);
        assert_eq!(console.output, b"A");
    }

    #[test]
    fn puts_stops_at_terminator() {
        let mut core = core_with(&[
            (0x3000, TrapVector::Puts.instruction()),
            (0x5000, u16::from(b'f')),
            (0x5001, u16::from(b'o')),
            (0x5002, u16::from(b'o')),
            (0x5004, u16::from(b'x')),
        ]);
        core.regs.set_gpr(GeneralRegister::R0, 0x5000);
        let mut console = StubConsole::default();
        step(&mut core, &mut console);
        assert_eq!(console.output, b"foo");
        assert_eq!(core.regs.pc(), 0x3001);
    }

    #[test]
    fn puts_interrupted_midway_keeps_pc() {
        let mut core = core_with(&[
            (0x3000, TrapVector::Puts.instruction()),
            (0x5000, u16::from(b'h')),
            (0x5001, u16::from(b'i')),
        ]);
        core.regs.set_gpr(GeneralRegister::R0, 0x5000);
        let mut console = StubConsole {
            accept_writes: Some(1),
            ..StubConsole::default()
        };
        assert_eq!(step(&mut core, &mut console), StepOutcome::Interrupted);
        assert_eq!(console.output, b"h");
        assert_eq!(core.regs.pc(), 0x3000);
    }

    #[test]
    fn trap_output_previews_without_side_effects() {
        let mut core = core_with(&[
            (0xFFFF, u16::from(b'w')),
            (0x0000, 0x0172),
            (0x0001, 0),
        ]);
        core.regs.set_gpr(GeneralRegister::R0, 0xFFFF);
        let before = core.clone();

        assert_eq!(trap_output(TrapVector::Puts, &core), b"wr");
        assert_eq!(trap_output(TrapVector::Out, &core), [0xFF]);
        assert!(trap_output(TrapVector::Halt, &core).is_empty());
        assert_eq!(core, before);
    }

    #[test]
    fn halt_advances_pc_and_stops() {
        let mut core = core_with(&[(0x3000, TrapVector::Halt.instruction())]);
        let mut console = StubConsole::default();
        assert_eq!(step(&mut core, &mut console), StepOutcome::Halted);
        assert!(console.halted);
        assert_eq!(core.regs.pc(), 0x3001);
    }

    #[test]
    fn ldi_from_latched_kbdr_acknowledges_key() {
        // LDI R0, #0 with pointer 0xFE02.
        let mut core = core_with(&[(0x3000, 0xA000), (0x3001, KBDR)]);
        core.latch_keyboard(u16::from(b'z'));
        let mut console = StubConsole {
            input: VecDeque::from([u16::from(b'z'), u16::from(b'y')]),
            ..StubConsole::default()
        };

        step(&mut core, &mut console);
        assert_eq!(core.regs.gpr(GeneralRegister::R0), u16::from(b'z'));
        assert_eq!(console.acknowledged, 1);
        assert_eq!(console.input, VecDeque::from([u16::from(b'y')]));
        assert_eq!(core.memory.read(KBSR) & KBSR_READY, 0);
    }

    #[test]
    fn polling_kbsr_does_not_acknowledge() {
        // LDI R1, #0 with pointer 0xFE00.
        let mut core = core_with(&[(0x3000, 0xA200), (0x3001, KBSR)]);
        core.latch_keyboard(u16::from(b'z'));
        let mut console = StubConsole::default();

        step(&mut core, &mut console);
        assert_eq!(core.regs.gpr(GeneralRegister::R1), KBSR_READY);
        assert_eq!(core.regs.cond(), FLAG_NEGATIVE);
        assert_eq!(console.acknowledged, 0);
    }
}
