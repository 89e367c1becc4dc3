//! `ADDR:BIT:KIND` fault specifications given on the command line.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use march_core::{FaultKind, MemoryError, Vram};

/// One fault injected from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultSpec {
    /// Word address.
    pub address: usize,
    /// Bit index within the word.
    pub bit: usize,
    /// Fault kind.
    pub kind: FaultKind,
}

impl FaultSpec {
    /// Assigns the fault to `memory`.
    ///
    /// # Errors
    ///
    /// Returns the memory's range error when the coordinate does not fit.
    pub fn apply(self, memory: &mut Vram) -> Result<(), MemoryError> {
        memory.set_error(self.address, self.bit, self.kind)
    }
}

impl fmt::Display for FaultSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}:{}:{}", self.address, self.bit, self.kind)
    }
}

impl FromStr for FaultSpec {
    type Err = anyhow::Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut parts = text.split(':');
        let (Some(address), Some(bit), Some(kind), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            bail!("expected ADDR:BIT:KIND, got '{text}'");
        };
        Ok(Self {
            address: parse_number(address).context("invalid fault address")?,
            bit: parse_number(bit).context("invalid fault bit")?,
            kind: kind.parse()?,
        })
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal number.
fn parse_number(text: &str) -> anyhow::Result<usize> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|err| anyhow!("'{text}': {err}"))
}

#[cfg(test)]
mod tests {
    use march_core::{FaultKind, Vram};

    use super::FaultSpec;

    #[test]
    fn parses_decimal_and_hex_coordinates() {
        assert_eq!(
            "10:3:stuck_at_1".parse::<FaultSpec>().unwrap(),
            FaultSpec {
                address: 10,
                bit: 3,
                kind: FaultKind::StuckAt1,
            }
        );
        assert_eq!(
            "0x1F:15:DECEPTIVE_READ_0".parse::<FaultSpec>().unwrap(),
            FaultSpec {
                address: 31,
                bit: 15,
                kind: FaultKind::DeceptiveRead0,
            }
        );
    }

    #[test]
    fn rejects_malformed_specs() {
        assert!("10:3".parse::<FaultSpec>().is_err());
        assert!("10:3:STUCK_AT_1:extra".parse::<FaultSpec>().is_err());
        assert!("ten:3:STUCK_AT_1".parse::<FaultSpec>().is_err());
        assert!("10:3:COUPLING".parse::<FaultSpec>().is_err());
    }

    #[test]
    fn display_round_trips() {
        let spec = FaultSpec {
            address: 5,
            bit: 2,
            kind: FaultKind::Transition1To0,
        };
        assert_eq!(spec.to_string(), "0x0005:2:TRANSITION_1_TO_0");
        assert_eq!(spec.to_string().parse::<FaultSpec>().unwrap(), spec);
    }

    #[test]
    fn apply_checks_memory_bounds() {
        let mut memory = Vram::new(4).unwrap();
        let inside: FaultSpec = "3:0:STUCK_AT_0".parse().unwrap();
        let outside: FaultSpec = "4:0:STUCK_AT_0".parse().unwrap();
        inside.apply(&mut memory).unwrap();
        assert!(outside.apply(&mut memory).is_err());
        assert_eq!(memory.get_error(3, 0), Ok(FaultKind::StuckAt0));
    }
}
