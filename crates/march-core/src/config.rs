//! JSON fault configuration: memory size plus the injected fault list.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fault::FaultKind;
use crate::memory::{MemoryError, Vram, DEFAULT_WORD_COUNT};

/// Error returned when a fault configuration cannot be loaded or stored.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The text is not a valid configuration document.
    #[error("malformed fault configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// The file could not be read or written.
    #[error("fault configuration I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The size or a fault coordinate does not fit the memory model.
    #[error("fault configuration does not fit the memory: {0}")]
    Memory(#[from] MemoryError),
}

/// One injected fault as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FaultRecord {
    /// Word address.
    pub addr: usize,
    /// Bit index within the word.
    pub bit: usize,
    /// Fault kind name; unknown names are ignored on load.
    #[serde(rename = "type")]
    pub kind: String,
}

/// Memory size and fault assignments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FaultConfig {
    /// Memory size in words.
    #[serde(default = "default_word_count")]
    pub ram_size_words: usize,
    /// Assigned faults, `NONE` excluded.
    #[serde(default)]
    pub faults: Vec<FaultRecord>,
}

const fn default_word_count() -> usize {
    DEFAULT_WORD_COUNT
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            ram_size_words: DEFAULT_WORD_COUNT,
            faults: Vec::new(),
        }
    }
}

impl FaultConfig {
    /// Captures the size and every assigned fault of `memory`.
    #[must_use]
    pub fn from_vram(memory: &Vram) -> Self {
        Self {
            ram_size_words: memory.word_count(),
            faults: memory
                .faults()
                .map(|site| FaultRecord {
                    addr: usize::from(site.address),
                    bit: usize::from(site.bit),
                    kind: site.kind.name().to_string(),
                })
                .collect(),
        }
    }

    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when `text` is not valid JSON of the
    /// expected shape.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serializes as pretty JSON with four-space indentation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Builds a fresh memory seeded with the configured faults.
    ///
    /// Records with an unknown fault kind are skipped. Nothing is built if
    /// the size or any coordinate is out of range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Memory`] for an invalid size or coordinate.
    pub fn build_vram(&self) -> Result<Vram, ConfigError> {
        let mut memory = Vram::new(self.ram_size_words)?;
        let mut skipped = 0_usize;
        for record in &self.faults {
            let Ok(kind) = record.kind.parse::<FaultKind>() else {
                tracing::debug!(
                    addr = record.addr,
                    bit = record.bit,
                    kind = %record.kind,
                    "skipping unknown fault kind"
                );
                skipped += 1;
                continue;
            };
            memory.set_error(record.addr, record.bit, kind)?;
        }
        tracing::debug!(
            words = memory.word_count(),
            faults = memory.fault_count(),
            skipped,
            "fault configuration applied"
        );
        Ok(memory)
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Writes the configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        fs::write(path, self.to_json()?)?;
        tracing::debug!(path = %path.display(), faults = self.faults.len(), "fault configuration saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, FaultConfig, FaultRecord};
    use crate::fault::FaultKind;
    use crate::memory::{MemoryError, Vram};

    fn record(addr: usize, bit: usize, kind: &str) -> FaultRecord {
        FaultRecord {
            addr,
            bit,
            kind: kind.to_string(),
        }
    }

    #[test]
    fn parses_sample_document() {
        let config = FaultConfig::from_json(
            r#"{
                "ram_size_words": 32,
                "faults": [
                    {"addr": 5, "bit": 3, "type": "STUCK_AT_1"},
                    {"addr": 10, "bit": 0, "type": "DECEPTIVE_READ_0"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.ram_size_words, 32);
        let memory = config.build_vram().unwrap();
        assert_eq!(memory.word_count(), 32);
        assert_eq!(memory.get_error(5, 3), Ok(FaultKind::StuckAt1));
        assert_eq!(memory.get_error(10, 0), Ok(FaultKind::DeceptiveRead0));
        assert_eq!(memory.fault_count(), 2);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = FaultConfig::from_json("{}").unwrap();
        assert_eq!(config, FaultConfig::default());
        assert_eq!(config.build_vram().unwrap().word_count(), 16);
    }

    #[test]
    fn unknown_kinds_are_skipped() {
        let config = FaultConfig {
            ram_size_words: 8,
            faults: vec![record(1, 1, "COUPLING_FAULT"), record(2, 2, "STUCK_AT_0")],
        };
        let memory = config.build_vram().unwrap();
        assert_eq!(memory.fault_count(), 1);
        assert_eq!(memory.get_error(2, 2), Ok(FaultKind::StuckAt0));
    }

    #[test]
    fn legacy_kind_names_are_accepted() {
        let config = FaultConfig {
            ram_size_words: 4,
            faults: vec![record(0, 0, "WRITE_OR_READ_DESTRUCTIVE_1"), record(1, 0, "NO")],
        };
        let memory = config.build_vram().unwrap();
        assert_eq!(memory.get_error(0, 0), Ok(FaultKind::Destructive1));
        assert_eq!(memory.fault_count(), 1);
    }

    #[test]
    fn out_of_range_coordinates_fail_the_whole_load() {
        let config = FaultConfig {
            ram_size_words: 4,
            faults: vec![record(0, 0, "STUCK_AT_1"), record(4, 0, "STUCK_AT_1")],
        };
        assert!(matches!(
            config.build_vram(),
            Err(ConfigError::Memory(MemoryError::OutOfRange { address: 4, .. }))
        ));

        let config = FaultConfig {
            ram_size_words: 4,
            faults: vec![record(0, 16, "STUCK_AT_1")],
        };
        assert!(matches!(
            config.build_vram(),
            Err(ConfigError::Memory(MemoryError::BitOutOfRange { bit: 16 }))
        ));
    }

    #[test]
    fn invalid_size_is_rejected() {
        let config = FaultConfig {
            ram_size_words: 0,
            faults: Vec::new(),
        };
        assert!(matches!(
            config.build_vram(),
            Err(ConfigError::Memory(MemoryError::InvalidWordCount(0)))
        ));
    }

    #[test]
    fn malformed_text_is_a_parse_error() {
        assert!(matches!(
            FaultConfig::from_json("{\"ram_size_words\": \"big\"}"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            FaultConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn saved_document_uses_four_space_indent() {
        let mut memory = Vram::new(8).unwrap();
        memory.set_error(3, 7, FaultKind::Transition0To1).unwrap();
        let text = FaultConfig::from_vram(&memory).to_json().unwrap();
        assert_eq!(
            text,
            r#"{
    "ram_size_words": 8,
    "faults": [
        {
            "addr": 3,
            "bit": 7,
            "type": "TRANSITION_0_TO_1"
        }
    ]
}"#
        );
    }

    #[test]
    fn save_then_load_restores_faults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faults.json");
        let mut memory = Vram::new(16).unwrap();
        memory.set_error(0, 15, FaultKind::IncorrectRead1).unwrap();
        memory.set_error(9, 2, FaultKind::StuckAt0).unwrap();

        FaultConfig::from_vram(&memory).save(&path).unwrap();
        let restored = FaultConfig::load(&path).unwrap().build_vram().unwrap();
        assert_eq!(restored, memory);
    }
}
