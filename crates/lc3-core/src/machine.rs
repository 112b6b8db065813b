//! The machine: shared state plus the two-task run loop.
//!
//! [`Machine::start`] runs an input-drain task and an execution task on
//! scoped threads that share one [`CancelToken`]. The execution task owns the
//! device registers: it latches the oldest queued character into `KBDR`
//! before every step, so no other thread ever writes memory during a run.

use std::sync::mpsc::{Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::api::{
    ConsoleBus, MachineConfig, RunOutcome, StepErrorPolicy, StepOutcome, StopReason,
};
use crate::decoder::{Decoder, Instruction};
use crate::encoding::TrapVector;
use crate::execute::{step_one, trap_output};
use crate::fault::StepError;
use crate::io::{send_char, CancelToken, InputQueue, InputWait, SendAbort};
use crate::memory::Memory;
use crate::state::{CoreState, Register, RegisterFile, RunState, REGISTER_COUNT};

#[derive(Debug, Default)]
struct Ports {
    source: Option<Receiver<char>>,
    sink: Option<SyncSender<char>>,
}

/// An LC-3 machine instance.
///
/// All methods take `&self`; [`Machine::stop`] and the read accessors may be
/// called from other threads while [`Machine::start`] is running. The core
/// lock is never held across a wait for input or an output hand-off.
#[derive(Debug, Default)]
pub struct Machine {
    core: Mutex<CoreState>,
    run_state: Mutex<RunState>,
    input: InputQueue,
    ports: Mutex<Ports>,
    cancel: Mutex<Option<CancelToken>>,
    config: MachineConfig,
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Machine {
    /// Creates a stopped machine with zeroed memory and registers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stopped machine using `config`.
    #[must_use]
    pub fn with_config(config: MachineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replaces the whole memory image.
    pub fn load_memory(&self, memory: Memory) {
        relock(&self.core).memory = memory;
    }

    /// Replaces all ten register slots (`R0..R7`, `PC`, `COND`).
    pub fn load_registers(&self, values: [u16; REGISTER_COUNT]) {
        relock(&self.core).regs = RegisterFile::from_slots(values);
    }

    /// Reads the word at `addr`.
    #[must_use]
    pub fn read_memory(&self, addr: u16) -> u16 {
        relock(&self.core).memory.read(addr)
    }

    /// Reads one register slot.
    #[must_use]
    pub fn read_register(&self, reg: Register) -> u16 {
        relock(&self.core).regs.get(reg)
    }

    /// Snapshot of memory and registers.
    #[must_use]
    pub fn snapshot(&self) -> CoreState {
        relock(&self.core).clone()
    }

    /// Sets the channel keyboard characters arrive on.
    pub fn set_input_source(&self, source: Receiver<char>) {
        relock(&self.ports).source = Some(source);
    }

    /// Sets the channel `OUT`/`PUTS` characters are handed to.
    pub fn set_output_sink(&self, sink: SyncSender<char>) {
        relock(&self.ports).sink = Some(sink);
    }

    /// Number of received characters not yet consumed by the program.
    #[must_use]
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    /// Sets `PC` to the program origin and clears `COND`.
    pub fn reset(&self) {
        relock(&self.core).reset();
    }

    /// Current run state.
    #[must_use]
    pub fn state(&self) -> RunState {
        *relock(&self.run_state)
    }

    /// Stops the machine and fires the current cancellation signal.
    ///
    /// Safe to call from any thread, repeatedly, and with no run active.
    pub fn stop(&self) {
        *relock(&self.run_state) = RunState::Stopped;
        if let Some(token) = relock(&self.cancel).as_ref() {
            if token.cancel() {
                debug!("machine stopped");
            }
        }
        self.input.wake_all();
    }

    fn stop_run(&self, cancel: &CancelToken) {
        *relock(&self.run_state) = RunState::Stopped;
        cancel.cancel();
        self.input.wake_all();
    }

    fn latch_keyboard(&self, core: &mut CoreState) {
        if !core.keyboard_ready_for_input() {
            return;
        }
        if let Some(ch) = self.input.front() {
            core.latch_keyboard(ch);
        }
    }

    fn push_input(&self, ch: char) {
        match u16::try_from(u32::from(ch)) {
            Ok(code) => {
                debug!(code, "input queued");
                self.input.push(code);
            }
            Err(_) => warn!(?ch, "input character outside 16-bit range dropped"),
        }
    }

    /// Executes one instruction outside of [`Machine::start`].
    ///
    /// Pending characters on the input source are queued first. A blocking
    /// trap waits in slices of the configured tick and returns
    /// [`StepOutcome::Interrupted`] if [`Machine::stop`] is called meanwhile.
    /// `GETC` returns [`StepOutcome::InputClosed`] when no input source is
    /// set or it has disconnected and nothing is queued.
    ///
    /// # Errors
    ///
    /// Returns the [`StepError`] of an unimplemented opcode or trap vector;
    /// the machine state is unchanged in that case.
    pub fn step(&self) -> Result<StepOutcome, StepError> {
        let (source, sink) = {
            let mut ports = relock(&self.ports);
            (ports.source.take(), ports.sink.clone())
        };
        let mut closed = source.is_none();
        if let Some(source) = source.as_ref() {
            loop {
                match source.try_recv() {
                    Ok(ch) => self.push_input(ch),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        closed = true;
                        break;
                    }
                }
            }
        }
        self.input.set_closed(closed);

        let cancel = relock(&self.cancel)
            .get_or_insert_with(CancelToken::new)
            .clone();
        let io = StepIo {
            source: source.as_ref().filter(|_| !closed),
            sink: sink.as_ref(),
            cancel: &cancel,
            tick: self.config.tick_interval(),
        };
        let result = self.step_with(&io);

        if let Some(source) = source.filter(|_| !closed) {
            relock(&self.ports).source.get_or_insert(source);
        }
        let mut slot = relock(&self.cancel);
        if slot.as_ref().is_some_and(CancelToken::is_cancelled) {
            *slot = None;
        }
        result
    }

    /// Runs the program until `HALT`, cancellation, a fault, or a `GETC`
    /// that can no longer be satisfied.
    ///
    /// Blocks until both the input-drain and the execution task have
    /// finished; the run state is `Stopped` afterwards. `tick` bounds how
    /// long any wait goes without re-checking `cancel`. A call while another
    /// run is active returns immediately with [`StopReason::Cancelled`].
    pub fn start(&self, cancel: CancelToken, tick: Duration) -> RunOutcome {
        {
            let mut state = relock(&self.run_state);
            if state.is_running() {
                warn!("start called while already running");
                return RunOutcome {
                    steps: 0,
                    stop_reason: StopReason::Cancelled,
                };
            }
            *relock(&self.cancel) = Some(cancel.clone());
            *state = RunState::Running;
        }

        let (source, sink) = {
            let mut ports = relock(&self.ports);
            (ports.source.take(), ports.sink.clone())
        };
        self.input.set_closed(source.is_none());
        let tick = tick.max(Duration::from_micros(1));
        debug!(?tick, has_input = source.is_some(), has_output = sink.is_some(), "run started");

        let (outcome, source) = thread::scope(|scope| {
            let drain = scope.spawn(|| self.drain_input(source, &cancel, tick));
            let execution = scope.spawn(|| {
                self.execute_until_stopped(&StepIo {
                    source: None,
                    sink: sink.as_ref(),
                    cancel: &cancel,
                    tick,
                })
            });

            let outcome = execution
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
            let source = drain
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
            (outcome, source)
        });

        if let Some(source) = source {
            relock(&self.ports).source.get_or_insert(source);
        }
        *relock(&self.cancel) = None;
        *relock(&self.run_state) = RunState::Stopped;

        debug!(steps = outcome.steps, reason = ?outcome.stop_reason, "run finished");
        outcome
    }

    fn drain_input(
        &self,
        source: Option<Receiver<char>>,
        cancel: &CancelToken,
        tick: Duration,
    ) -> Option<Receiver<char>> {
        let Some(rx) = source else {
            cancel.wait();
            return None;
        };
        while !cancel.is_cancelled() {
            match rx.recv_timeout(tick) {
                Ok(ch) => self.push_input(ch),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("input source disconnected");
                    self.input.close();
                    cancel.wait();
                    return None;
                }
            }
        }
        Some(rx)
    }

    fn execute_until_stopped(&self, io: &StepIo<'_>) -> RunOutcome {
        let mut steps = 0_u64;
        let stop_reason = loop {
            if io.cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            match self.step_with(io) {
                Ok(StepOutcome::Retired) => steps += 1,
                Ok(StepOutcome::Halted) => {
                    steps += 1;
                    break StopReason::Halted;
                }
                Ok(StepOutcome::Interrupted) => break StopReason::Cancelled,
                Ok(StepOutcome::InputClosed) => {
                    debug!("GETC with input closed and queue empty");
                    break StopReason::InputClosed;
                }
                Err(err) => {
                    let mut core = relock(&self.core);
                    let pc = core.regs.pc();
                    match self.config.on_step_error {
                        StepErrorPolicy::Halt => {
                            warn!(pc, %err, "stopping on step error");
                            break StopReason::Faulted(err);
                        }
                        StepErrorPolicy::Continue => {
                            warn!(pc, %err, "skipping unimplemented instruction");
                            core.regs.set_pc(pc.wrapping_add(1));
                        }
                    }
                }
            }
        };

        self.stop_run(io.cancel);
        RunOutcome { steps, stop_reason }
    }

    /// One step with the core lock held only while state is read or written.
    ///
    /// A `GETC` with nothing queued waits for input unlocked and then
    /// re-examines the instruction. `OUT` and `PUTS` hand their characters
    /// off unlocked before the trap retires, so an interrupted hand-off
    /// leaves `PC` on the trap.
    fn step_with(&self, io: &StepIo<'_>) -> Result<StepOutcome, StepError> {
        loop {
            let mut core = relock(&self.core);
            self.latch_keyboard(&mut core);
            let word = core.memory.read(core.regs.pc());
            if let Ok(Instruction::Trap { vector }) = Decoder::decode(word) {
                match vector {
                    TrapVector::Getc if self.input.is_empty() => {
                        drop(core);
                        match self.wait_for_input(io) {
                            InputWait::Ready => continue,
                            InputWait::Cancelled => return Ok(StepOutcome::Interrupted),
                            InputWait::Closed => return Ok(StepOutcome::InputClosed),
                        }
                    }
                    TrapVector::Out | TrapVector::Puts => {
                        let output = trap_output(vector, &core);
                        drop(core);
                        if !self.hand_off(io, &output) {
                            return Ok(StepOutcome::Interrupted);
                        }
                        core = relock(&self.core);
                    }
                    TrapVector::Getc | TrapVector::Halt => {}
                }
            }
            let mut console = MachineConsole {
                machine: self,
                cancel: io.cancel,
            };
            return step_one(&mut core, &mut console);
        }
    }

    fn wait_for_input(&self, io: &StepIo<'_>) -> InputWait {
        let Some(source) = io.source else {
            return self.input.wait_for_input(io.cancel, io.tick);
        };
        // Direct step: no drain task, so receive here.
        loop {
            if io.cancel.is_cancelled() {
                return InputWait::Cancelled;
            }
            match source.recv_timeout(io.tick) {
                Ok(ch) => {
                    self.push_input(ch);
                    if !self.input.is_empty() {
                        return InputWait::Ready;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("input source disconnected");
                    self.input.close();
                    return InputWait::Closed;
                }
            }
        }
    }

    /// Delivers `output` to the sink; `false` when cancelled part way.
    fn hand_off(&self, io: &StepIo<'_>, output: &[u8]) -> bool {
        let Some(sink) = io.sink else {
            debug!(len = output.len(), "no output sink, characters dropped");
            return true;
        };
        for &ch in output {
            match send_char(sink, char::from(ch), io.cancel, io.tick) {
                Ok(()) => {}
                Err(SendAbort::Cancelled) => return false,
                Err(SendAbort::Disconnected) => {
                    warn!(ch, "output sink disconnected, character dropped");
                    return true;
                }
            }
        }
        true
    }
}

/// Channels and run signal one step may block on.
struct StepIo<'a> {
    /// Set only for direct steps, where no drain task feeds the queue.
    source: Option<&'a Receiver<char>>,
    sink: Option<&'a SyncSender<char>>,
    cancel: &'a CancelToken,
    tick: Duration,
}

/// [`ConsoleBus`] used while the core lock is held. Input has already been
/// awaited and output already handed off, so nothing here blocks.
struct MachineConsole<'a> {
    machine: &'a Machine,
    cancel: &'a CancelToken,
}

impl ConsoleBus for MachineConsole<'_> {
    fn read_char(&mut self) -> Option<u16> {
        self.machine.input.pop()
    }

    fn write_char(&mut self, _ch: u8) -> bool {
        true
    }

    fn acknowledge_key(&mut self) {
        let acknowledged = self.machine.input.pop();
        debug!(?acknowledged, "keyboard data acknowledged");
    }

    fn halt(&mut self) {
        self.machine.stop_run(self.cancel);
    }
}
