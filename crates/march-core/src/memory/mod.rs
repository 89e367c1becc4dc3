//! Word-addressable memory model with sparse per-bit fault injection.

/// Bounds validation for addresses, bits and memory sizes.
pub mod access;

use std::collections::BTreeMap;

use tracing::debug;

pub use access::{validate_address, validate_bit, validate_word_count, MemoryError};

use crate::FaultKind;

/// Stored word type.
pub type Word = u16;

/// Word address within a memory instance.
pub type Address = u16;

/// Width of every memory word in bits.
pub const BITS_PER_WORD: usize = Word::BITS as usize;

/// Smallest supported memory, in words.
pub const MIN_WORD_COUNT: usize = 1;

/// Largest supported memory, in words.
pub const MAX_WORD_COUNT: usize = 1024;

/// Memory size used when the caller does not pick one.
pub const DEFAULT_WORD_COUNT: usize = 16;

const LAST_BIT: u8 = 15;

/// One assigned fault, as enumerated by [`Vram::faults`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaultSite {
    /// Word address of the faulty cell.
    pub address: Address,
    /// Bit position of the faulty cell (0 is the least significant bit).
    pub bit: u8,
    /// Assigned fault kind, never [`FaultKind::None`].
    pub kind: FaultKind,
}

/// Fault-aware memory of `W` sixteen-bit words.
///
/// The memory keeps the true stored value of every word and a sparse map of
/// per-bit faults. Reads and writes pass each bit through its fault's
/// transform. A memory is never resized: build a new instance instead, which
/// starts with no faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vram {
    words: Box<[Word]>,
    /// Bit set = written and not read since. Drives deceptive-read faults.
    armed: Box<[Word]>,
    faults: BTreeMap<(Address, u8), FaultKind>,
}

impl Default for Vram {
    fn default() -> Self {
        Self::zeroed(DEFAULT_WORD_COUNT)
    }
}

impl Vram {
    /// Creates a zeroed, fault-free memory of `word_count` words.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::InvalidWordCount`] when `word_count` is outside
    /// `1..=1024`.
    pub fn new(word_count: usize) -> Result<Self, MemoryError> {
        validate_word_count(word_count)?;
        Ok(Self::zeroed(word_count))
    }

    fn zeroed(word_count: usize) -> Self {
        Self {
            words: vec![0; word_count].into_boxed_slice(),
            armed: vec![0; word_count].into_boxed_slice(),
            faults: BTreeMap::new(),
        }
    }

    /// Number of words in this memory.
    #[must_use]
    pub const fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Reads the word at `address` with every assigned fault applied.
    ///
    /// A read disarms the word: deceptive-read faults only misreport on the
    /// first read after a write.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::OutOfRange`] when `address` is not below the
    /// word count.
    pub fn read(&mut self, address: usize) -> Result<Word, MemoryError> {
        let address = validate_address(address, self.word_count())?;
        Ok(self.read_at(address))
    }

    /// Writes `word` at `address` with every assigned fault applied.
    ///
    /// Every bit of the word is re-armed for deceptive-read faults.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::OutOfRange`] when `address` is not below the
    /// word count.
    pub fn write(&mut self, address: usize, word: Word) -> Result<(), MemoryError> {
        let address = validate_address(address, self.word_count())?;
        self.write_at(address, word);
        Ok(())
    }

    /// Assigns `kind` to the cell at `(address, bit)`.
    ///
    /// Assigning [`FaultKind::None`] removes any existing fault. The stored
    /// bit value is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::OutOfRange`] or [`MemoryError::BitOutOfRange`]
    /// when the coordinate is outside the memory.
    pub fn set_error(&mut self, address: usize, bit: usize, kind: FaultKind) -> Result<(), MemoryError> {
        let address = validate_address(address, self.word_count())?;
        let bit = validate_bit(bit)?;
        if kind == FaultKind::None {
            if let Some(previous) = self.faults.remove(&(address, bit)) {
                debug!(address, bit, %previous, "fault cleared");
            }
        } else if let Some(previous) = self.faults.insert((address, bit), kind) {
            debug!(address, bit, %previous, %kind, "fault replaced");
        } else {
            debug!(address, bit, %kind, "fault assigned");
        }
        Ok(())
    }

    /// Returns the fault assigned to `(address, bit)`, [`FaultKind::None`]
    /// when unset.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::OutOfRange`] or [`MemoryError::BitOutOfRange`]
    /// when the coordinate is outside the memory.
    pub fn get_error(&self, address: usize, bit: usize) -> Result<FaultKind, MemoryError> {
        let address = validate_address(address, self.word_count())?;
        let bit = validate_bit(bit)?;
        Ok(self
            .faults
            .get(&(address, bit))
            .copied()
            .unwrap_or_default())
    }

    /// Removes every fault assigned to bits of `address` and returns how many
    /// were removed.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::OutOfRange`] when `address` is not below the
    /// word count.
    pub fn clear_word_errors(&mut self, address: usize) -> Result<usize, MemoryError> {
        let address = validate_address(address, self.word_count())?;
        let bits: Vec<_> = self
            .faults
            .range((address, 0)..=(address, LAST_BIT))
            .map(|(key, _)| *key)
            .collect();
        for key in &bits {
            self.faults.remove(key);
        }
        Ok(bits.len())
    }

    /// Removes every assigned fault. Stored word values are kept.
    pub fn clear_errors(&mut self) {
        debug!(count = self.faults.len(), "all faults cleared");
        self.faults.clear();
    }

    /// Number of cells carrying a fault.
    #[must_use]
    pub fn fault_count(&self) -> usize {
        self.faults.len()
    }

    /// Iterates assigned faults in ascending `(address, bit)` order.
    pub fn faults(&self) -> impl Iterator<Item = FaultSite> + '_ {
        self.faults
            .iter()
            .map(|(&(address, bit), &kind)| FaultSite { address, bit, kind })
    }

    /// Reads an address already known to be in range.
    pub(crate) fn read_at(&mut self, address: Address) -> Word {
        let index = usize::from(address);
        let stored = self.words[index];
        let armed = self.armed[index];
        let mut word = stored;

        for (&(_, bit), kind) in self.faults.range((address, 0)..=(address, LAST_BIT)) {
            let mask: Word = 1 << bit;
            let returned = kind.apply_on_read(stored & mask != 0, armed & mask != 0);
            word = if returned { word | mask } else { word & !mask };
        }

        self.armed[index] = 0;
        word
    }

    /// Writes an address already known to be in range.
    pub(crate) fn write_at(&mut self, address: Address, word: Word) {
        let index = usize::from(address);
        let previous = self.words[index];
        let mut stored = word;

        for (&(_, bit), kind) in self.faults.range((address, 0)..=(address, LAST_BIT)) {
            let mask: Word = 1 << bit;
            let landed = kind.apply_on_write(previous & mask != 0, word & mask != 0);
            stored = if landed { stored | mask } else { stored & !mask };
        }

        self.words[index] = stored;
        self.armed[index] = Word::MAX;
    }
}
