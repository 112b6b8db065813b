use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use lc3_core::{MachineConfig, StepErrorPolicy};

use crate::error::CliError;

/// Command-line arguments of `lc3`.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "lc3",
    version,
    about = "Run an LC-3 program image in the terminal",
    long_about = "Loads a big-endian LC-3 image (first word = origin), sets PC to 0x3000 and runs it.\n\nKeyboard input feeds GETC and the KBSR/KBDR registers; OUT and PUTS print to stdout. Ctrl-C stops the machine.\n\nExamples:\n  lc3 2048.obj\n  lc3 rogue.obj --on-error continue -vv"
)]
pub struct Cli {
    /// Program image to run.
    pub image: PathBuf,

    /// Granularity of cancellable waits, in microseconds.
    #[arg(long = "tick-us", value_name = "N")]
    pub tick_us: Option<u64>,

    /// Reaction to an unimplemented opcode or trap.
    #[arg(long = "on-error", value_enum, value_name = "POLICY")]
    pub on_error: Option<ErrorPolicyArg>,

    /// JSON machine configuration; flags given on the command line win.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// `--on-error` values.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicyArg {
    /// Stop the run and exit with status 2.
    Halt,
    /// Log and skip the offending word.
    Continue,
}

impl From<ErrorPolicyArg> for StepErrorPolicy {
    fn from(arg: ErrorPolicyArg) -> Self {
        match arg {
            ErrorPolicyArg::Halt => Self::Halt,
            ErrorPolicyArg::Continue => Self::Continue,
        }
    }
}

impl Cli {
    /// Builds the machine configuration from the config file and flags.
    ///
    /// # Errors
    ///
    /// Fails when the config file cannot be read or parsed.
    pub fn machine_config(&self) -> Result<MachineConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_str(&text).map_err(|source| CliError::ConfigParse {
                    path: path.clone(),
                    source,
                })?
            }
            None => MachineConfig::default(),
        };
        if let Some(tick_us) = self.tick_us {
            config.tick_interval_us = tick_us;
        }
        if let Some(policy) = self.on_error {
            config.on_step_error = policy.into();
        }
        Ok(config)
    }

    /// Default log filter for the chosen verbosity; `RUST_LOG` overrides it.
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
