//! Architectural machine state: register file, run state, and the combined core.

/// Register file types and condition-flag helpers.
pub mod registers;
/// Stopped/running state machine.
pub mod run_state;

pub use registers::{
    condition_for, GeneralRegister, Register, RegisterFile, FLAG_NEGATIVE, FLAG_POSITIVE,
    FLAG_ZERO, GENERAL_REGISTER_COUNT, REGISTER_COUNT,
};
pub use run_state::RunState;

use crate::memory::{Memory, KBDR, KBSR, KBSR_READY, PROGRAM_ORIGIN};

/// Memory plus register file: everything a single `Step` reads or writes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoreState {
    /// Register file.
    pub regs: RegisterFile,
    /// Flat 64 Ki-word memory image.
    pub memory: Memory,
    kbdr_read: bool,
}

impl CoreState {
    /// Applies reset semantics: `PC = 0x3000`, `COND = 0`.
    ///
    /// General-purpose registers and memory are preserved.
    pub const fn reset(&mut self) {
        self.regs.set_pc(PROGRAM_ORIGIN);
        self.regs.set_cond(0);
    }

    /// Reads memory on behalf of an executing load instruction.
    ///
    /// A read of `KBDR` while a character is latched is remembered so the
    /// character can be acknowledged once the instruction retires.
    pub fn load(&mut self, addr: u16) -> u16 {
        if addr == KBDR && !self.keyboard_ready_for_input() {
            self.kbdr_read = true;
        }
        self.memory.read(addr)
    }

    /// Returns and clears the pending `KBDR` acknowledgement.
    pub const fn take_kbdr_read(&mut self) -> bool {
        let read = self.kbdr_read;
        self.kbdr_read = false;
        read
    }

    /// Returns `true` when `KBSR` has no unread character latched.
    #[must_use]
    pub fn keyboard_ready_for_input(&self) -> bool {
        self.memory.read(KBSR) & KBSR_READY == 0
    }

    /// Latches `ch` into `KBDR` and raises the `KBSR` ready bit.
    pub fn latch_keyboard(&mut self, ch: u16) {
        let status = self.memory.read(KBSR);
        self.memory.write(KBSR, status | KBSR_READY);
        self.memory.write(KBDR, ch);
    }

    /// Clears the `KBSR` ready bit so the next queued character can be latched.
    pub fn clear_keyboard_ready(&mut self) {
        let status = self.memory.read(KBSR);
        self.memory.write(KBSR, status & !KBSR_READY);
    }
}
