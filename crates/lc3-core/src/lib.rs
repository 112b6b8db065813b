//! Core engine of the LC-3 virtual machine.
//!
//! The crate models the 64 Ki-word memory, the ten-slot register file, the
//! fetch-decode-execute cycle with the `GETC`/`OUT`/`PUTS`/`HALT` trap
//! routines, the memory-mapped keyboard registers, and a cancellable
//! two-task run loop.

/// Word-addressed memory and the fixed device-register map.
pub mod memory;
pub use memory::{
    is_device_register, Memory, IMAGE_LOAD_LIMIT, KBDR, KBSR, KBSR_READY, MEMORY_WORDS,
    PROGRAM_ORIGIN,
};

/// Public host-facing API contracts and configuration.
pub mod api;
pub use api::{
    ConsoleBus, MachineConfig, RunOutcome, StepErrorPolicy, StepOutcome, StopReason,
    DEFAULT_TICK_INTERVAL_US,
};

/// Architectural state: registers, run state, and the combined core.
pub mod state;
pub use state::{
    condition_for, CoreState, GeneralRegister, Register, RegisterFile, RunState, FLAG_NEGATIVE,
    FLAG_POSITIVE, FLAG_ZERO, GENERAL_REGISTER_COUNT, REGISTER_COUNT,
};

/// Opcode and trap-vector encodings.
pub mod encoding;
pub use encoding::{Opcode, TrapVector};

/// Instruction decoder with field extraction and sign extension.
pub mod decoder;
pub use decoder::{sign_extend, Decoder, Instruction, JumpTarget, Operand};

/// Decode failures reported by `Step`.
pub mod fault;
pub use fault::StepError;

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{execute_instruction, step_one};

/// Cancellation, the input queue, and channel hand-off.
pub mod io;
pub use io::{send_char, Backoff, CancelToken, InputQueue, InputWait, SendAbort};

/// Program image loader.
pub mod image;
pub use image::{read_image, read_image_file, ImageError};

/// The machine and its run loop.
pub mod machine;
pub use machine::Machine;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;
