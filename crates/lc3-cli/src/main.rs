//! `lc3` binary: run an LC-3 program image in the terminal.

use std::process::ExitCode;

use clap::Parser;
use crossterm as _;
use lc3_cli::{init_tracing, run, Cli};
use lc3_core::StopReason;
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;
use tracing::info;
use tracing_subscriber as _;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    match run(&cli) {
        Ok(outcome) => {
            info!(steps = outcome.steps, reason = ?outcome.stop_reason, "machine stopped");
            match outcome.stop_reason {
                StopReason::Halted | StopReason::Cancelled | StopReason::InputClosed => {
                    ExitCode::SUCCESS
                }
                StopReason::Faulted(err) => {
                    eprintln!("lc3: {err}");
                    ExitCode::from(2)
                }
            }
        }
        Err(err) => {
            eprintln!("lc3: {err}");
            ExitCode::FAILURE
        }
    }
}
