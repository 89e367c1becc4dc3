//! Closed catalog of per-bit fault kinds and their read/write perturbation rules.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Fault model assigned to a single `(address, bit)` cell.
///
/// Every kind is a pure transform of the bit value seen on write or on read.
/// The transforms live in [`FaultKind::apply_on_write`] and
/// [`FaultKind::apply_on_read`]; both match exhaustively, so a new variant
/// cannot be added without deciding its behavior in each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[repr(u8)]
pub enum FaultKind {
    /// Fault-free cell.
    #[default]
    None = 0,
    /// Every write stores 0.
    #[cfg_attr(feature = "serde", serde(rename = "STUCK_AT_0"))]
    StuckAt0 = 1,
    /// Every write stores 1.
    #[cfg_attr(feature = "serde", serde(rename = "STUCK_AT_1"))]
    StuckAt1 = 2,
    /// The cell can only move 0 to 1; writing 0 over a stored 1 is ignored.
    #[cfg_attr(feature = "serde", serde(rename = "TRANSITION_0_TO_1"))]
    Transition0To1 = 3,
    /// The cell can only move 1 to 0; writing 1 over a stored 0 is ignored.
    #[cfg_attr(feature = "serde", serde(rename = "TRANSITION_1_TO_0"))]
    Transition1To0 = 4,
    /// A write of 1 is corrupted to 0.
    #[cfg_attr(feature = "serde", serde(rename = "DESTRUCTIVE_0"))]
    Destructive0 = 5,
    /// A write of 0 is corrupted to 1.
    #[cfg_attr(feature = "serde", serde(rename = "DESTRUCTIVE_1"))]
    Destructive1 = 6,
    /// A stored 0 always reads back as 1.
    #[cfg_attr(feature = "serde", serde(rename = "INCORRECT_READ_0"))]
    IncorrectRead0 = 7,
    /// A stored 1 always reads back as 0.
    #[cfg_attr(feature = "serde", serde(rename = "INCORRECT_READ_1"))]
    IncorrectRead1 = 8,
    /// A stored 0 reads back as 1 on the first read after a write only.
    #[cfg_attr(feature = "serde", serde(rename = "DECEPTIVE_READ_0"))]
    DeceptiveRead0 = 9,
    /// A stored 1 reads back as 0 on the first read after a write only.
    #[cfg_attr(feature = "serde", serde(rename = "DECEPTIVE_READ_1"))]
    DeceptiveRead1 = 10,
}

impl FaultKind {
    /// Every fault kind in stable code order.
    pub const ALL: [Self; 11] = [
        Self::None,
        Self::StuckAt0,
        Self::StuckAt1,
        Self::Transition0To1,
        Self::Transition1To0,
        Self::Destructive0,
        Self::Destructive1,
        Self::IncorrectRead0,
        Self::IncorrectRead1,
        Self::DeceptiveRead0,
        Self::DeceptiveRead1,
    ];

    /// Resolves the bit that ends up stored when `written` is written over
    /// `previous`.
    #[must_use]
    pub const fn apply_on_write(self, previous: bool, written: bool) -> bool {
        match self {
            Self::StuckAt0 => false,
            Self::StuckAt1 => true,
            Self::Transition0To1 => previous || written,
            Self::Transition1To0 => previous && written,
            Self::Destructive0 => false,
            Self::Destructive1 => true,
            Self::None
            | Self::IncorrectRead0
            | Self::IncorrectRead1
            | Self::DeceptiveRead0
            | Self::DeceptiveRead1 => written,
        }
    }

    /// Resolves the bit returned by a read of `stored`.
    ///
    /// `first_read_since_write` is true when the cell was written and has not
    /// been read since; only the deceptive-read kinds look at it.
    #[must_use]
    pub const fn apply_on_read(self, stored: bool, first_read_since_write: bool) -> bool {
        match self {
            Self::IncorrectRead0 => true,
            Self::IncorrectRead1 => false,
            Self::DeceptiveRead0 => stored || first_read_since_write,
            Self::DeceptiveRead1 => stored && !first_read_since_write,
            Self::None
            | Self::StuckAt0
            | Self::StuckAt1
            | Self::Transition0To1
            | Self::Transition1To0
            | Self::Destructive0
            | Self::Destructive1 => stored,
        }
    }

    /// Returns `true` for kinds that perturb the value stored on write.
    #[must_use]
    pub const fn is_write_fault(self) -> bool {
        matches!(
            self,
            Self::StuckAt0
                | Self::StuckAt1
                | Self::Transition0To1
                | Self::Transition1To0
                | Self::Destructive0
                | Self::Destructive1
        )
    }

    /// Returns `true` for kinds that perturb the value returned on read.
    #[must_use]
    pub const fn is_read_fault(self) -> bool {
        matches!(
            self,
            Self::IncorrectRead0 | Self::IncorrectRead1 | Self::DeceptiveRead0 | Self::DeceptiveRead1
        )
    }

    /// Stable wire name used by fault configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::StuckAt0 => "STUCK_AT_0",
            Self::StuckAt1 => "STUCK_AT_1",
            Self::Transition0To1 => "TRANSITION_0_TO_1",
            Self::Transition1To0 => "TRANSITION_1_TO_0",
            Self::Destructive0 => "DESTRUCTIVE_0",
            Self::Destructive1 => "DESTRUCTIVE_1",
            Self::IncorrectRead0 => "INCORRECT_READ_0",
            Self::IncorrectRead1 => "INCORRECT_READ_1",
            Self::DeceptiveRead0 => "DECEPTIVE_READ_0",
            Self::DeceptiveRead1 => "DECEPTIVE_READ_1",
        }
    }

    /// Converts a fault kind to its stable code.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable code back into a fault kind.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::StuckAt0),
            2 => Some(Self::StuckAt1),
            3 => Some(Self::Transition0To1),
            4 => Some(Self::Transition1To0),
            5 => Some(Self::Destructive0),
            6 => Some(Self::Destructive1),
            7 => Some(Self::IncorrectRead0),
            8 => Some(Self::IncorrectRead1),
            9 => Some(Self::DeceptiveRead0),
            10 => Some(Self::DeceptiveRead1),
            _ => None,
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a fault-kind name is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown fault kind '{0}'")]
pub struct UnknownFaultKind(pub String);

impl FromStr for FaultKind {
    type Err = UnknownFaultKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        // Older front-ends wrote `NO` and the `WRITE_OR_READ_` prefix.
        match upper.as_str() {
            "NO" => return Ok(Self::None),
            "WRITE_OR_READ_DESTRUCTIVE_0" => return Ok(Self::Destructive0),
            "WRITE_OR_READ_DESTRUCTIVE_1" => return Ok(Self::Destructive1),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == upper)
            .ok_or_else(|| UnknownFaultKind(s.to_string()))
    }
}
