//! Fault-aware VRAM model and single-step march-test engine.

/// Fault kinds and their per-bit read/write transforms.
pub mod fault;
pub use fault::{FaultKind, UnknownFaultKind};

/// Memory model with sparse per-bit fault storage.
pub mod memory;
pub use memory::{
    validate_address, validate_bit, validate_word_count, Address, FaultSite, MemoryError, Vram,
    Word, BITS_PER_WORD, DEFAULT_WORD_COUNT, MAX_WORD_COUNT, MIN_WORD_COUNT,
};

/// March-test programs, their notation parser and file discovery.
pub mod program;
pub use program::{
    discover_programs, AddressOrder, Bit, MalformedProgram, Operation, Phase, ProgramEntry,
    ProgramLoadError, TestProgram, PROGRAM_EXTENSION,
};

/// Single-step execution cursor and bound runner.
pub mod runner;
pub use runner::{Cursor, CursorPosition, RunSummary, RunnerState, StepResult, TestRunner};

/// Error aggregation and text report.
pub mod report;
pub use report::{ErrorSummary, Report, Status, DETAIL_LIMIT};

/// Automatic-stepping rate and timer model.
pub mod pacing;
pub use pacing::{
    AutoStepper, PacingError, StepPacing, DEFAULT_OPS_PER_MINUTE, MAX_OPS_PER_MINUTE,
    MIN_OPS_PER_MINUTE,
};

/// JSON fault configuration.
#[cfg(feature = "serde")]
pub mod config;
#[cfg(feature = "serde")]
pub use config::{ConfigError, FaultConfig, FaultRecord};

#[cfg(test)]
use proptest as _;
