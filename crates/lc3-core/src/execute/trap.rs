//! Trap service routines.

use tracing::debug;

use crate::api::{ConsoleBus, StepOutcome};
use crate::encoding::TrapVector;
use crate::state::{CoreState, GeneralRegister};

/// Executes a decoded trap. `next_pc` is written only when the routine completes.
pub fn execute_trap(
    vector: TrapVector,
    core: &mut CoreState,
    console: &mut dyn ConsoleBus,
    next_pc: u16,
) -> StepOutcome {
    match vector {
        TrapVector::Getc => getc(core, console, next_pc),
        TrapVector::Out => out(core, console, next_pc),
        TrapVector::Puts => puts(core, console, next_pc),
        TrapVector::Halt => {
            debug!(pc = core.regs.pc(), "HALT");
            core.regs.set_pc(next_pc);
            console.halt();
            StepOutcome::Halted
        }
    }
}

fn getc(core: &mut CoreState, console: &mut dyn ConsoleBus, next_pc: u16) -> StepOutcome {
    let Some(ch) = console.read_char() else {
        return StepOutcome::Interrupted;
    };
    core.regs.set_gpr(GeneralRegister::R0, ch);
    core.clear_keyboard_ready();
    core.regs.set_pc(next_pc);
    StepOutcome::Retired
}

fn out(core: &mut CoreState, console: &mut dyn ConsoleBus, next_pc: u16) -> StepOutcome {
    for byte in trap_output(TrapVector::Out, core) {
        if !console.write_char(byte) {
            return StepOutcome::Interrupted;
        }
    }
    core.regs.set_pc(next_pc);
    StepOutcome::Retired
}

fn puts(core: &mut CoreState, console: &mut dyn ConsoleBus, next_pc: u16) -> StepOutcome {
    for byte in trap_output(TrapVector::Puts, core) {
        if !console.write_char(byte) {
            return StepOutcome::Interrupted;
        }
    }
    core.regs.set_pc(next_pc);
    StepOutcome::Retired
}

/// Bytes `OUT` or `PUTS` would write from the current state, in order.
///
/// `OUT` yields the low byte of `R0`. `PUTS` yields the low byte of each word
/// from the address in `R0` up to, not including, the first zero word. Other
/// vectors write nothing.
#[must_use]
pub fn trap_output(vector: TrapVector, core: &CoreState) -> Vec<u8> {
    let r0 = core.regs.gpr(GeneralRegister::R0);
    match vector {
        TrapVector::Out => vec![r0.to_be_bytes()[1]],
        TrapVector::Puts => {
            let mut bytes = Vec::new();
            let mut addr = r0;
            loop {
                let word = core.memory.read(addr);
                if word == 0 {
                    break bytes;
                }
                bytes.push(word.to_be_bytes()[1]);
                addr = addr.wrapping_add(1);
            }
        }
        TrapVector::Getc | TrapVector::Halt => Vec::new(),
    }
}
