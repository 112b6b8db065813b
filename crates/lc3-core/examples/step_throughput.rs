//! Step throughput harness for lc3-core.
//!
//! Runs a counting loop directly through `step_one` and reports retired
//! instructions per second.
//!
//! ```sh
//! cargo run --release -p lc3-core --example step_throughput
//! ```

#![allow(clippy::pedantic)]

use lc3_core::{step_one, ConsoleBus, CoreState, StepOutcome, TrapVector, PROGRAM_ORIGIN};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use tempfile as _;
use thiserror as _;
use tracing as _;

use std::time::{Duration, Instant};

const MEASURE_FOR: Duration = Duration::from_secs(2);

/// Console that never blocks and discards output.
struct NullConsole;

impl ConsoleBus for NullConsole {
    fn read_char(&mut self) -> Option<u16> {
        Some(0)
    }

    fn write_char(&mut self, _ch: u8) -> bool {
        true
    }

    fn acknowledge_key(&mut self) {}

    fn halt(&mut self) {}
}

fn counting_loop() -> CoreState {
    let program = [
        0x5020, // AND R0, R0, #0
        0x1021, // ADD R0, R0, #1
        0x6240, // LDR R1, R1, #0
        0x7440, // STR R2, R1, #0
        0x0FFC, // BRnzp #-4
        TrapVector::Halt.instruction(),
    ];
    let mut core = CoreState::default();
    for (addr, word) in (PROGRAM_ORIGIN..).zip(program) {
        core.memory.write(addr, word);
    }
    core.reset();
    core
}

fn main() {
    let mut core = counting_loop();
    let mut console = NullConsole;
    let mut retired = 0_u64;

    let started = Instant::now();
    while started.elapsed() < MEASURE_FOR {
        for _ in 0..10_000 {
            match step_one(&mut core, &mut console) {
                Ok(StepOutcome::Retired) => retired += 1,
                Ok(outcome) => panic!("unexpected {outcome:?}"),
                Err(err) => panic!("{err}"),
            }
        }
    }
    let elapsed = started.elapsed();

    let per_second = retired as f64 / elapsed.as_secs_f64();
    println!("retired {retired} instructions in {:.2?}", elapsed);
    println!("{:.1} M instructions/s", per_second / 1_000_000.0);
    println!("R0 = {:#06x}", core.regs.gpr(lc3_core::GeneralRegister::R0));
}
