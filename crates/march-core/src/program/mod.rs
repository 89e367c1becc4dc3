//! March-test program model: ordered phases of per-address operations.

/// Test-program file discovery by extension.
pub mod discover;
/// March-notation parser.
pub mod parse;

use std::fmt;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::memory::Word;

pub use discover::{discover_programs, ProgramEntry, PROGRAM_EXTENSION};
pub use parse::MalformedProgram;

/// Pattern bit written or expected by an operation, replicated across the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Bit {
    /// All-zeros background (`0x0000`).
    Zero,
    /// All-ones background (`0xFFFF`).
    One,
}

impl Bit {
    /// Word with this bit replicated into every position.
    #[must_use]
    pub const fn word(self) -> Word {
        match self {
            Self::Zero => 0,
            Self::One => Word::MAX,
        }
    }

    /// Digit used in march notation.
    #[must_use]
    pub const fn digit(self) -> char {
        match self {
            Self::Zero => '0',
            Self::One => '1',
        }
    }
}

/// One primitive operation applied at the visited address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Operation {
    /// Write the replicated pattern.
    Write(Bit),
    /// Read and compare against the replicated pattern.
    ReadCheck(Bit),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write(bit) => write!(f, "w{}", bit.digit()),
            Self::ReadCheck(bit) => write!(f, "r{}", bit.digit()),
        }
    }
}

/// Traversal direction of a phase over the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AddressOrder {
    /// `0, 1, ..., W-1`.
    #[default]
    Ascending,
    /// `W-1, ..., 1, 0`.
    Descending,
}

impl AddressOrder {
    /// Address visited at traversal position `index` in a memory of
    /// `word_count` words. `index` must be below `word_count`.
    #[must_use]
    pub const fn address_at(self, index: usize, word_count: usize) -> usize {
        match self {
            Self::Ascending => index,
            Self::Descending => word_count - 1 - index,
        }
    }

    /// Keyword used in march notation.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Ascending => "up",
            Self::Descending => "down",
        }
    }
}

/// One traversal pass: a direction and the operations run at each address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Phase {
    /// Address traversal direction.
    pub order: AddressOrder,
    /// Operations applied, in order, at every visited address.
    pub operations: Vec<Operation>,
}

impl Phase {
    /// Creates a phase.
    #[must_use]
    pub const fn new(order: AddressOrder, operations: Vec<Operation>) -> Self {
        Self { order, operations }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.order.keyword())?;
        for (index, operation) in self.operations.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{operation}")?;
        }
        f.write_str(")")
    }
}

/// A complete march test.
///
/// A program with no phases is valid; running it ends on the first step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TestProgram {
    /// Phases in execution order.
    pub phases: Vec<Phase>,
}

/// Error returned by [`TestProgram::load`].
#[derive(Debug, Error)]
pub enum ProgramLoadError {
    /// The file could not be read.
    #[error("failed to read test program: {0}")]
    Io(#[from] io::Error),
    /// The file content is not a valid march test.
    #[error(transparent)]
    Malformed(#[from] MalformedProgram),
}

impl TestProgram {
    /// Creates a program from phases.
    #[must_use]
    pub const fn new(phases: Vec<Phase>) -> Self {
        Self { phases }
    }

    /// Parses march notation.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedProgram`] on the first structural violation; no
    /// partial program is produced.
    pub fn parse(text: &str) -> Result<Self, MalformedProgram> {
        parse::parse_program(text)
    }

    /// Reads and parses a test-program file.
    ///
    /// # Errors
    ///
    /// Returns [`ProgramLoadError::Io`] when the file cannot be read and
    /// [`ProgramLoadError::Malformed`] when it does not parse.
    pub fn load(path: &Path) -> Result<Self, ProgramLoadError> {
        let text = std::fs::read_to_string(path)?;
        let program = Self::parse(&text)?;
        tracing::debug!(
            path = %path.display(),
            phases = program.phases.len(),
            "test program loaded"
        );
        Ok(program)
    }

    /// Total primitive operations executed against a memory of `word_count`
    /// words, i.e. the number of non-terminal steps of a full run.
    #[must_use]
    pub fn operation_count(&self, word_count: usize) -> usize {
        self.phases
            .iter()
            .map(|phase| phase.operations.len() * word_count)
            .sum()
    }

    /// Operations applied per address across all phases (the `kN` of a
    /// `kN` march test).
    #[must_use]
    pub fn operations_per_address(&self) -> usize {
        self.phases.iter().map(|phase| phase.operations.len()).sum()
    }
}

impl fmt::Display for TestProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, phase) in self.phases.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{phase}")?;
        }
        Ok(())
    }
}
