//! Single-step march-test execution.
//!
//! A [`Cursor`] is the flat execution position (phase, traversal index,
//! operation) plus the accumulated failing addresses. It holds no borrows,
//! so a front end can keep it next to the memory and program it drives and
//! step it from a timer. [`TestRunner`] binds a cursor to one program and
//! one memory for callers that want a self-contained handle.

mod state;

pub use state::{CursorPosition, RunSummary, RunnerState, StepResult};

use crate::memory::{Address, Vram};
use crate::program::{Operation, Phase, TestProgram};

/// Flat execution position within a test program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    word_count: usize,
    phase: usize,
    index: usize,
    operation: usize,
    state: RunnerState,
    detected: Vec<Address>,
}

impl Cursor {
    /// Creates a cursor at the first operation of the first phase for a
    /// memory of `word_count` words.
    #[must_use]
    pub const fn new(word_count: usize) -> Self {
        Self {
            word_count,
            phase: 0,
            index: 0,
            operation: 0,
            state: RunnerState::Ready,
            detected: Vec::new(),
        }
    }

    /// Word count the cursor traverses.
    #[must_use]
    pub const fn word_count(&self) -> usize {
        self.word_count
    }

    /// Current execution state.
    #[must_use]
    pub const fn state(&self) -> RunnerState {
        self.state
    }

    /// Addresses whose read check failed, in detection order. Not
    /// deduplicated.
    #[must_use]
    pub fn detected_errors(&self) -> &[Address] {
        &self.detected
    }

    /// Consumes the cursor, returning the failing addresses.
    #[must_use]
    pub fn into_detected_errors(self) -> Vec<Address> {
        self.detected
    }

    /// Position of the next operation, or `None` once `program` has no
    /// operations left.
    #[must_use]
    pub fn position(&self, program: &TestProgram) -> Option<CursorPosition> {
        if self.state == RunnerState::Ended || self.word_count == 0 {
            return None;
        }
        let (phase_index, phase) = program
            .phases
            .iter()
            .enumerate()
            .skip(self.phase)
            .find(|(_, phase)| !phase.operations.is_empty())?;
        let (index, operation) = if phase_index == self.phase {
            (self.index, self.operation)
        } else {
            (0, 0)
        };
        Some(CursorPosition {
            phase: phase_index,
            address: phase_address(phase, index, self.word_count),
            operation,
        })
    }

    /// Runs exactly one primitive operation of `program` against `memory`.
    ///
    /// Once the program is exhausted every call returns
    /// [`StepResult::Ended`] without touching memory. Stepping against a
    /// memory smaller than the cursor's word count also ends the run.
    pub fn step(&mut self, program: &TestProgram, memory: &mut Vram) -> StepResult {
        if self.state == RunnerState::Ended {
            return StepResult::Ended;
        }
        if memory.word_count() < self.word_count {
            tracing::warn!(
                cursor_words = self.word_count,
                memory_words = memory.word_count(),
                "memory is smaller than the cursor's address space; ending run"
            );
            return self.finish();
        }
        let Some((phase, operation)) = self.next_operation(program) else {
            return self.finish();
        };

        self.state = RunnerState::Running;
        let address = phase_address(phase, self.index, self.word_count);
        let result = match operation {
            Operation::Write(bit) => {
                memory.write_at(address, bit.word());
                StepResult::Write { address }
            }
            Operation::ReadCheck(bit) => {
                let observed = memory.read_at(address);
                if observed == bit.word() {
                    StepResult::CheckOk { address }
                } else {
                    tracing::debug!(
                        address,
                        expected = bit.word(),
                        observed,
                        "read check failed"
                    );
                    self.detected.push(address);
                    StepResult::CheckFailed { address }
                }
            }
        };
        tracing::trace!(
            phase = self.phase,
            operation = self.operation,
            ?result,
            "step"
        );

        self.advance(phase.operations.len());
        result
    }

    /// Skips zero-operation phases and returns the operation at the cursor.
    fn next_operation<'p>(&mut self, program: &'p TestProgram) -> Option<(&'p Phase, Operation)> {
        if self.word_count == 0 {
            return None;
        }
        loop {
            let phase = program.phases.get(self.phase)?;
            if let Some(&operation) = phase.operations.get(self.operation) {
                return Some((phase, operation));
            }
            self.phase += 1;
            self.index = 0;
            self.operation = 0;
        }
    }

    const fn advance(&mut self, operations_in_phase: usize) {
        self.operation += 1;
        if self.operation < operations_in_phase {
            return;
        }
        self.operation = 0;
        self.index += 1;
        if self.index < self.word_count {
            return;
        }
        self.index = 0;
        self.phase += 1;
    }

    fn finish(&mut self) -> StepResult {
        self.state = RunnerState::Ended;
        tracing::debug!(failures = self.detected.len(), "test program ended");
        StepResult::Ended
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn phase_address(phase: &Phase, index: usize, word_count: usize) -> Address {
    phase.order.address_at(index, word_count) as Address
}

/// A cursor bound to one program and one memory.
///
/// The memory is borrowed mutably for the runner's lifetime, so it cannot
/// be replaced underneath a live run.
#[derive(Debug)]
pub struct TestRunner<'a> {
    program: &'a TestProgram,
    memory: &'a mut Vram,
    cursor: Cursor,
}

impl<'a> TestRunner<'a> {
    /// Binds a fresh cursor to `program` and `memory`.
    pub const fn new(program: &'a TestProgram, memory: &'a mut Vram) -> Self {
        let cursor = Cursor::new(memory.word_count());
        Self {
            program,
            memory,
            cursor,
        }
    }

    /// Runs one primitive operation. See [`Cursor::step`].
    pub fn step(&mut self) -> StepResult {
        self.cursor.step(self.program, self.memory)
    }

    /// Steps until [`StepResult::Ended`], returning the run's counts.
    pub fn run_to_end(&mut self) -> RunSummary {
        let mut summary = RunSummary::default();
        loop {
            let result = self.step();
            if result.is_ended() {
                return summary;
            }
            summary.record(result);
        }
    }

    /// Current execution state.
    #[must_use]
    pub const fn state(&self) -> RunnerState {
        self.cursor.state()
    }

    /// Position of the next operation, if any remain.
    #[must_use]
    pub fn position(&self) -> Option<CursorPosition> {
        self.cursor.position(self.program)
    }

    /// Failing addresses so far, in detection order.
    #[must_use]
    pub fn detected_errors(&self) -> &[Address] {
        self.cursor.detected_errors()
    }

    /// Program being executed.
    #[must_use]
    pub const fn program(&self) -> &TestProgram {
        self.program
    }

    /// Bound memory.
    #[must_use]
    pub const fn memory(&self) -> &Vram {
        self.memory
    }

    /// Bound memory, for fault edits or inspection reads between steps.
    pub const fn memory_mut(&mut self) -> &mut Vram {
        self.memory
    }

    /// Releases the borrows, returning the cursor.
    #[must_use]
    pub fn into_cursor(self) -> Cursor {
        self.cursor
    }
}
