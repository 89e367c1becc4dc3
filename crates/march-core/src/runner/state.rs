use crate::memory::Address;

/// Execution state of a runner cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunnerState {
    /// Cursor sits at the first operation; nothing has run.
    #[default]
    Ready,
    /// At least one operation has run and the program is not exhausted.
    Running,
    /// Every phase has been exhausted. Terminal.
    Ended,
}

/// Outcome of one runner step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum StepResult {
    /// A pattern was written at `address`.
    Write {
        /// Visited address.
        address: Address,
    },
    /// A read at `address` matched the expected pattern.
    CheckOk {
        /// Visited address.
        address: Address,
    },
    /// A read at `address` did not match; the address was recorded.
    CheckFailed {
        /// Visited address.
        address: Address,
    },
    /// The program is exhausted. Returned again by every later step.
    Ended,
}

impl StepResult {
    /// Address touched by this step, if any.
    #[must_use]
    pub const fn address(self) -> Option<Address> {
        match self {
            Self::Write { address } | Self::CheckOk { address } | Self::CheckFailed { address } => {
                Some(address)
            }
            Self::Ended => None,
        }
    }

    /// Returns `true` for the terminal result.
    #[must_use]
    pub const fn is_ended(self) -> bool {
        matches!(self, Self::Ended)
    }
}

/// Position of the next operation a cursor will run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorPosition {
    /// Index of the phase within the program.
    pub phase: usize,
    /// Address the next operation targets.
    pub address: Address,
    /// Index of the operation within the phase.
    pub operation: usize,
}

/// Counts from a batched run, see [`crate::TestRunner::run_to_end`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RunSummary {
    /// Non-terminal steps taken.
    pub steps: usize,
    /// Write operations executed.
    pub writes: usize,
    /// Read-check operations executed, passed or failed.
    pub checks: usize,
    /// Read checks that failed.
    pub failures: usize,
}

impl RunSummary {
    /// Folds one step result into the counts.
    pub const fn record(&mut self, result: StepResult) {
        match result {
            StepResult::Write { .. } => self.writes += 1,
            StepResult::CheckOk { .. } => self.checks += 1,
            StepResult::CheckFailed { .. } => {
                self.checks += 1;
                self.failures += 1;
            }
            StepResult::Ended => return,
        }
        self.steps += 1;
    }
}
