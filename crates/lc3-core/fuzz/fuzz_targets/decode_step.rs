#![no_main]

use lc3_core::{read_image, step_one, ConsoleBus, CoreState, Decoder, Memory};
use libfuzzer_sys::fuzz_target;

/// Console with a fixed input script; output is discarded.
struct ScriptConsole<'a> {
    input: &'a [u8],
}

impl ConsoleBus for ScriptConsole<'_> {
    fn read_char(&mut self) -> Option<u16> {
        let (&first, rest) = self.input.split_first()?;
        self.input = rest;
        Some(u16::from(first))
    }

    fn write_char(&mut self, _ch: u8) -> bool {
        true
    }

    fn acknowledge_key(&mut self) {
        if let Some((_, rest)) = self.input.split_first() {
            self.input = rest;
        }
    }

    fn halt(&mut self) {}
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let word = u16::from_be_bytes([data[0], data[1]]);
    let _ = Decoder::decode(word);

    // Treat the input as an image and run a bounded number of steps.
    let memory = read_image(data).unwrap_or_else(|_| Memory::new());
    let mut core = CoreState::default();
    core.memory = memory;
    core.reset();
    let mut console = ScriptConsole { input: data };
    for _ in 0..256 {
        if step_one(&mut core, &mut console).is_err() {
            break;
        }
    }
});
