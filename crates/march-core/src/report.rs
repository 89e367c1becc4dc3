//! Aggregation of detected errors into a test report.

use std::collections::BTreeMap;
use std::fmt;

use crate::memory::Address;

/// Maximum number of unique addresses listed in a report's detail section.
pub const DETAIL_LIMIT: usize = 100;

const RULE_HEAVY: &str = "==================================================";
const RULE_LIGHT: &str = "--------------------------------------------------";

/// Overall verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Status {
    /// No check failed.
    Pass,
    /// At least one check failed.
    Fail,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        })
    }
}

/// Failing addresses grouped by address.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ErrorSummary {
    total_events: usize,
    counts: BTreeMap<Address, usize>,
}

impl ErrorSummary {
    /// Groups a detection-ordered error list, duplicates included.
    #[must_use]
    pub fn from_errors(errors: &[Address]) -> Self {
        let mut counts = BTreeMap::new();
        for &address in errors {
            *counts.entry(address).or_insert(0) += 1;
        }
        Self {
            total_events: errors.len(),
            counts,
        }
    }

    /// Number of failed checks.
    #[must_use]
    pub const fn total_events(&self) -> usize {
        self.total_events
    }

    /// Number of distinct failing addresses.
    #[must_use]
    pub fn unique_addresses(&self) -> usize {
        self.counts.len()
    }

    /// `(address, occurrences)` pairs in ascending address order.
    pub fn counts(&self) -> impl Iterator<Item = (Address, usize)> + '_ {
        self.counts.iter().map(|(&address, &count)| (address, count))
    }

    /// [`Status::Pass`] iff no event was recorded.
    #[must_use]
    pub const fn status(&self) -> Status {
        if self.total_events == 0 {
            Status::Pass
        } else {
            Status::Fail
        }
    }
}

/// Text report for one test run.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    test_name: &'a str,
    summary: &'a ErrorSummary,
}

impl<'a> Report<'a> {
    /// Creates a report for `test_name`.
    #[must_use]
    pub const fn new(test_name: &'a str, summary: &'a ErrorSummary) -> Self {
        Self { test_name, summary }
    }

    /// Renders the report text.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.summary;
        writeln!(f, "{RULE_HEAVY}")?;
        writeln!(f, "TEST REPORT")?;
        writeln!(f, "{RULE_HEAVY}")?;
        writeln!(f, "Test        : {}", self.test_name)?;
        writeln!(f, "Status      : {}", summary.status())?;
        writeln!(f, "Events      : {}", summary.total_events())?;
        writeln!(f, "Faulty cells: {}", summary.unique_addresses())?;
        writeln!(f, "{RULE_LIGHT}")?;

        if summary.total_events() == 0 {
            return writeln!(f, "No errors detected.");
        }

        writeln!(f, "Details (address [count]):")?;
        for (index, (address, count)) in summary.counts().take(DETAIL_LIMIT).enumerate() {
            write!(f, "{}. 0x{address:04X}", index + 1)?;
            if count > 1 {
                write!(f, " ({count})")?;
            }
            writeln!(f)?;
        }
        let omitted = summary.unique_addresses().saturating_sub(DETAIL_LIMIT);
        if omitted > 0 {
            writeln!(f, "... and {omitted} more addresses.")?;
        }
        Ok(())
    }
}
