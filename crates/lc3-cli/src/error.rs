use std::io;
use std::path::PathBuf;

use lc3_core::ImageError;
use thiserror::Error;

/// Setup failures of the `lc3` front end. All of them exit with status 1.
#[derive(Debug, Error)]
pub enum CliError {
    /// The program image could not be loaded.
    #[error(transparent)]
    Image(#[from] ImageError),
    /// The configuration file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        /// Path given with `--config`.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The configuration file is not valid JSON for a machine config.
    #[error("invalid config {}: {source}", path.display())]
    ConfigParse {
        /// Path given with `--config`.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// Terminal setup or console I/O failed.
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}
