//! Loader for big-endian program images.
//!
//! An image is a sequence of 16-bit big-endian words. The first word is the
//! origin; every following word is stored at consecutive addresses starting
//! there, up to (not including) `0xFFFF`. Anything past that boundary is
//! ignored.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::memory::{Memory, IMAGE_LOAD_LIMIT};

/// Failures while reading a program image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The underlying reader failed.
    #[error("failed to read image: {0}")]
    Io(#[from] io::Error),
    /// The stream ended before a full origin word.
    #[error("image is missing its origin word")]
    MissingOrigin,
    /// The stream ended in the middle of the word destined for `addr`.
    #[error("image ends inside the word for address {addr:#06x}")]
    TruncatedWord {
        /// Address the partial word would have been stored at.
        addr: u16,
    },
}

/// Reads an image from `reader` into a fresh [`Memory`].
///
/// # Errors
///
/// See [`ImageError`].
pub fn read_image(mut reader: impl Read) -> Result<Memory, ImageError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let Some((origin, body)) = bytes.split_first_chunk::<2>() else {
        return Err(ImageError::MissingOrigin);
    };
    let origin = u16::from_be_bytes(*origin);

    let mut memory = Memory::new();
    let mut loaded = 0_usize;
    for (addr, chunk) in (origin..IMAGE_LOAD_LIMIT).zip(body.chunks(2)) {
        let &[hi, lo] = chunk else {
            return Err(ImageError::TruncatedWord { addr });
        };
        memory.write(addr, u16::from_be_bytes([hi, lo]));
        loaded += 1;
    }

    debug!(origin, words = loaded, "image loaded");
    Ok(memory)
}

/// Opens `path` and reads it with [`read_image`].
///
/// # Errors
///
/// See [`ImageError`].
pub fn read_image_file(path: impl AsRef<Path>) -> Result<Memory, ImageError> {
    let file = File::open(path)?;
    read_image(BufReader::new(file))
}
