//! Fixed addresses of the LC-3 memory map.

/// Address `PC` is set to by reset; conventional program load origin.
pub const PROGRAM_ORIGIN: u16 = 0x3000;
/// Keyboard status register (`KBSR`).
pub const KBSR: u16 = 0xFE00;
/// Keyboard data register (`KBDR`).
pub const KBDR: u16 = 0xFE02;
/// `KBSR` bit signalling that `KBDR` holds an unread character.
pub const KBSR_READY: u16 = 0x8000;
/// Exclusive upper bound for addresses written by the image loader.
pub const IMAGE_LOAD_LIMIT: u16 = 0xFFFF;

/// Returns `true` for the two memory-mapped keyboard registers.
#[must_use]
pub const fn is_device_register(addr: u16) -> bool {
    addr == KBSR || addr == KBDR
}

#[cfg(test)]
mod tests {
    use super::{is_device_register, KBDR, KBSR, PROGRAM_ORIGIN};

    #[test]
    fn keyboard_registers_are_the_only_device_registers() {
        assert!(is_device_register(KBSR));
        assert!(is_device_register(KBDR));
        assert!(!is_device_register(KBSR + 1));
        assert!(!is_device_register(PROGRAM_ORIGIN));
    }
}
