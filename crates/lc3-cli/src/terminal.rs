//! Terminal adapters: key capture, piped stdin, and the output writer.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{Receiver, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use lc3_core::{send_char, CancelToken, SendAbort};
use tracing::{debug, warn};

/// Keeps the terminal in raw mode until dropped.
#[derive(Debug)]
pub struct RawModeGuard(());

impl RawModeGuard {
    /// Switches the terminal to raw mode.
    ///
    /// # Errors
    ///
    /// Fails when the terminal refuses the mode change.
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self(()))
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(err) = terminal::disable_raw_mode() {
            warn!(%err, "failed to restore terminal mode");
        }
    }
}

/// What a key press means to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Deliver this character to the input source.
    Forward(char),
    /// Stop the machine.
    Interrupt,
    /// Not a character key.
    Ignore,
}

/// Maps a crossterm key event to a [`KeyAction`].
#[must_use]
pub fn key_action(key: KeyEvent) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return KeyAction::Ignore;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Interrupt,
        KeyCode::Char(ch) => KeyAction::Forward(ch),
        KeyCode::Enter => KeyAction::Forward('\n'),
        KeyCode::Tab => KeyAction::Forward('\t'),
        KeyCode::Backspace => KeyAction::Forward('\u{8}'),
        KeyCode::Esc => KeyAction::Forward('\u{1b}'),
        _ => KeyAction::Ignore,
    }
}

/// Forwards raw-mode key presses to `input` until `cancel` fires.
///
/// Ctrl-C fires `cancel`. Event polling uses `tick` as its timeout so the
/// thread can be joined promptly.
pub fn spawn_key_capture(
    input: SyncSender<char>,
    cancel: CancelToken,
    tick: Duration,
) -> JoinHandle<io::Result<()>> {
    thread::spawn(move || {
        while !cancel.is_cancelled() {
            if !event::poll(tick)? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };
            match key_action(key) {
                KeyAction::Forward(ch) => match send_char(&input, ch, &cancel, tick) {
                    Ok(()) | Err(SendAbort::Cancelled) => {}
                    Err(SendAbort::Disconnected) => break,
                },
                KeyAction::Interrupt => {
                    debug!("interrupt key");
                    cancel.cancel();
                }
                KeyAction::Ignore => {}
            }
        }
        Ok(())
    })
}

/// Forwards characters from a non-terminal stdin on a detached thread.
///
/// The thread ends at end of input or once the receiving side is dropped.
pub fn spawn_stdin_reader(input: SyncSender<char>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        let mut handle = stdin.lock();
        let mut line = String::new();
        loop {
            line.clear();
            match handle.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if line.chars().any(|ch| input.send(ch).is_err()) {
                        break;
                    }
                }
                Err(err) => {
                    warn!(%err, "stdin read failed");
                    break;
                }
            }
        }
        debug!("stdin reader finished");
    });
}

/// Writes `ch` to `out`, translating `\n` to `\r\n` when `raw` is set.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_char(out: &mut impl Write, ch: char, raw: bool) -> io::Result<()> {
    if raw && ch == '\n' {
        out.write_all(b"\r\n")?;
    } else {
        let mut buf = [0; 4];
        out.write_all(ch.encode_utf8(&mut buf).as_bytes())?;
    }
    out.flush()
}

/// Prints every character received on `output` until all senders are gone.
pub fn spawn_output_writer(output: Receiver<char>, raw: bool) -> JoinHandle<io::Result<()>> {
    thread::spawn(move || {
        let stdout = io::stdout();
        for ch in output {
            write_char(&mut stdout.lock(), ch, raw)?;
        }
        Ok(())
    })
}
