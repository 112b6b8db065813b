//! Word-addressed memory and the fixed device-register map.

/// Fixed addresses: program origin and keyboard registers.
pub mod map;

pub use map::{is_device_register, IMAGE_LOAD_LIMIT, KBDR, KBSR, KBSR_READY, PROGRAM_ORIGIN};

/// Number of addressable 16-bit words (64 Ki).
pub const MEMORY_WORDS: usize = u16::MAX as usize + 1;

/// Flat 64 Ki-word memory image.
///
/// Always holds exactly [`MEMORY_WORDS`] words, so every `u16` address is in
/// range and a whole-image replacement can never be partial.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    words: Box<[u16]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.words.iter().filter(|word| **word != 0).count();
        f.debug_struct("Memory")
            .field("words", &MEMORY_WORDS)
            .field("non_zero", &used)
            .finish()
    }
}

impl Memory {
    /// Allocates a zeroed image.
    #[must_use]
    pub fn new() -> Self {
        Self {
            words: vec![0; MEMORY_WORDS].into_boxed_slice(),
        }
    }

    /// Builds an image from `(address, word)` pairs; unlisted addresses are zero.
    #[must_use]
    pub fn with_words(words: impl IntoIterator<Item = (u16, u16)>) -> Self {
        let mut memory = Self::new();
        for (addr, word) in words {
            memory.write(addr, word);
        }
        memory
    }

    /// Builds an image from a full 64 Ki-word array.
    #[must_use]
    pub fn from_array(words: &[u16; MEMORY_WORDS]) -> Self {
        Self {
            words: words.to_vec().into_boxed_slice(),
        }
    }

    /// Reads the word at `addr`.
    #[must_use]
    pub fn read(&self, addr: u16) -> u16 {
        self.words[usize::from(addr)]
    }

    /// Writes `value` at `addr`.
    pub fn write(&mut self, addr: u16, value: u16) {
        self.words[usize::from(addr)] = value;
    }

    /// Returns the image as a slice indexed by address.
    #[must_use]
    pub fn as_slice(&self) -> &[u16] {
        &self.words
    }
}
