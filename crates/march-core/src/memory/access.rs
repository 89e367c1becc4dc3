//! Bounds policy for word addresses, bit positions and memory sizes.

use thiserror::Error;

use super::{Address, BITS_PER_WORD, MAX_WORD_COUNT, MIN_WORD_COUNT};

/// Errors raised by memory-model operations.
///
/// A failed call never changes the memory state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum MemoryError {
    /// Word address is not below the memory's word count.
    #[error("address {address:#06X} is out of range for {word_count} words")]
    OutOfRange {
        /// Rejected address.
        address: usize,
        /// Word count of the memory that rejected it.
        word_count: usize,
    },
    /// Bit position is not below [`BITS_PER_WORD`].
    #[error("bit {bit} is out of range for 16-bit words")]
    BitOutOfRange {
        /// Rejected bit position.
        bit: usize,
    },
    /// Requested memory size is outside the supported range.
    #[error("word count {0} is outside 1..=1024")]
    InvalidWordCount(usize),
}

/// Validates a word count for a new memory instance.
///
/// # Errors
///
/// Returns [`MemoryError::InvalidWordCount`] when `word_count` is outside
/// `MIN_WORD_COUNT..=MAX_WORD_COUNT`.
pub const fn validate_word_count(word_count: usize) -> Result<(), MemoryError> {
    if word_count >= MIN_WORD_COUNT && word_count <= MAX_WORD_COUNT {
        Ok(())
    } else {
        Err(MemoryError::InvalidWordCount(word_count))
    }
}

/// Validates a word address against a memory of `word_count` words.
///
/// # Errors
///
/// Returns [`MemoryError::InvalidWordCount`] when `word_count` exceeds
/// `MAX_WORD_COUNT`, and [`MemoryError::OutOfRange`] when
/// `address >= word_count`.
#[allow(clippy::cast_possible_truncation)]
pub const fn validate_address(address: usize, word_count: usize) -> Result<Address, MemoryError> {
    if word_count > MAX_WORD_COUNT {
        return Err(MemoryError::InvalidWordCount(word_count));
    }
    if address < word_count {
        // address < word_count <= MAX_WORD_COUNT, so the cast is lossless.
        Ok(address as Address)
    } else {
        Err(MemoryError::OutOfRange {
            address,
            word_count,
        })
    }
}

/// Validates a bit position within a word.
///
/// # Errors
///
/// Returns [`MemoryError::BitOutOfRange`] when `bit >= BITS_PER_WORD`.
#[allow(clippy::cast_possible_truncation)]
pub const fn validate_bit(bit: usize) -> Result<u8, MemoryError> {
    if bit < BITS_PER_WORD {
        Ok(bit as u8)
    } else {
        Err(MemoryError::BitOutOfRange { bit })
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_address, validate_bit, validate_word_count, MemoryError};
    use crate::memory::{BITS_PER_WORD, MAX_WORD_COUNT, MIN_WORD_COUNT};

    #[test]
    fn word_count_bounds_are_inclusive() {
        assert_eq!(validate_word_count(MIN_WORD_COUNT), Ok(()));
        assert_eq!(validate_word_count(MAX_WORD_COUNT), Ok(()));
        assert_eq!(
            validate_word_count(0),
            Err(MemoryError::InvalidWordCount(0))
        );
        assert_eq!(
            validate_word_count(MAX_WORD_COUNT + 1),
            Err(MemoryError::InvalidWordCount(MAX_WORD_COUNT + 1))
        );
    }

    #[test]
    fn address_must_be_below_word_count() {
        assert_eq!(validate_address(0, 1), Ok(0));
        assert_eq!(validate_address(15, 16), Ok(15));
        assert_eq!(
            validate_address(16, 16),
            Err(MemoryError::OutOfRange {
                address: 16,
                word_count: 16
            })
        );
    }

    #[test]
    fn address_is_rejected_for_oversized_memory() {
        assert_eq!(
            validate_address(65_536, 70_000),
            Err(MemoryError::InvalidWordCount(70_000))
        );
        assert_eq!(
            validate_address(0, MAX_WORD_COUNT + 1),
            Err(MemoryError::InvalidWordCount(MAX_WORD_COUNT + 1))
        );
        assert_eq!(validate_address(MAX_WORD_COUNT - 1, MAX_WORD_COUNT), Ok(1023));
    }

    #[test]
    fn bit_must_be_below_word_width() {
        for bit in 0..BITS_PER_WORD {
            assert!(validate_bit(bit).is_ok());
        }
        assert_eq!(
            validate_bit(BITS_PER_WORD),
            Err(MemoryError::BitOutOfRange { bit: BITS_PER_WORD })
        );
    }

    #[test]
    fn error_messages_name_the_rejected_value() {
        let err = validate_address(0x20, 16).unwrap_err();
        assert_eq!(err.to_string(), "address 0x0020 is out of range for 16 words");
        let err = validate_bit(16).unwrap_err();
        assert_eq!(err.to_string(), "bit 16 is out of range for 16-bit words");
    }
}
