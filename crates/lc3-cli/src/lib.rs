//! Terminal front end for the LC-3 virtual machine.

use std::io::{self, IsTerminal};
use std::sync::mpsc::sync_channel;

use lc3_core::{read_image_file, CancelToken, Machine, RunOutcome};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Command-line arguments and configuration assembly.
pub mod args;
/// Front-end error type.
pub mod error;
/// Terminal input capture and output writing.
pub mod terminal;

pub use args::{Cli, ErrorPolicyArg};
pub use error::CliError;

use terminal::{spawn_key_capture, spawn_output_writer, spawn_stdin_reader, RawModeGuard};

/// Installs the stderr log subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Loads the image named by `cli` and runs it against the terminal.
///
/// Returns once the machine halts, is interrupted, or faults; the terminal
/// is restored and all output has been written by then.
///
/// # Errors
///
/// Fails before the run starts when the configuration or image cannot be
/// loaded or the terminal cannot be set up, and afterwards on console I/O
/// errors.
pub fn run(cli: &Cli) -> Result<RunOutcome, CliError> {
    let config = cli.machine_config()?;
    let memory = read_image_file(&cli.image)?;
    let tick = config.tick_interval();

    let machine = Machine::with_config(config);
    machine.load_memory(memory);
    machine.reset();

    let (input_tx, input_rx) = sync_channel(0);
    let (output_tx, output_rx) = sync_channel(0);
    machine.set_input_source(input_rx);
    machine.set_output_sink(output_tx);

    let cancel = CancelToken::new();
    let interactive = io::stdin().is_terminal();
    debug!(image = %cli.image.display(), interactive, "starting");

    let raw_mode = if interactive {
        Some(RawModeGuard::enable()?)
    } else {
        None
    };
    let writer = spawn_output_writer(output_rx, raw_mode.is_some());
    let capture = if interactive {
        Some(spawn_key_capture(input_tx, cancel.clone(), tick))
    } else {
        spawn_stdin_reader(input_tx);
        None
    };

    let outcome = machine.start(cancel.clone(), tick);
    cancel.cancel();
    drop(machine);

    if let Some(capture) = capture {
        capture
            .join()
            .unwrap_or_else(|payload| std::panic::resume_unwind(payload))?;
    }
    writer
        .join()
        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))?;
    drop(raw_mode);

    Ok(outcome)
}

#[cfg(test)]
use tempfile as _;
