//! Discovery of test-program files in a directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File extension (without the dot) that marks a test-program file.
pub const PROGRAM_EXTENSION: &str = "march";

/// A discovered test-program file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProgramEntry {
    /// Human-facing test identifier: the file name without its extension.
    pub name: String,
    /// Full path to the file.
    pub path: PathBuf,
}

/// Lists the test-program files directly inside `dir`, sorted by name.
///
/// Only regular files whose extension is [`PROGRAM_EXTENSION`]
/// (case-insensitive) are returned. Subdirectories are not searched.
///
/// # Errors
///
/// Returns the underlying I/O error when `dir` cannot be listed.
pub fn discover_programs(dir: &Path) -> io::Result<Vec<ProgramEntry>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || !is_program_file(&path) {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        entries.push(ProgramEntry {
            name: name.to_string(),
            path,
        });
    }

    entries.sort();
    tracing::debug!(dir = %dir.display(), count = entries.len(), "test programs discovered");
    Ok(entries)
}

fn is_program_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PROGRAM_EXTENSION))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{discover_programs, ProgramEntry};

    #[test]
    fn lists_only_program_files_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mats_plus.march"), "up(w0)").unwrap();
        fs::write(dir.path().join("March_C.MARCH"), "up(w0)").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a test").unwrap();
        fs::create_dir(dir.path().join("nested.march")).unwrap();

        let entries = discover_programs(dir.path()).unwrap();
        assert_eq!(
            entries,
            vec![
                ProgramEntry {
                    name: "March_C".to_string(),
                    path: dir.path().join("March_C.MARCH"),
                },
                ProgramEntry {
                    name: "mats_plus".to_string(),
                    path: dir.path().join("mats_plus.march"),
                },
            ]
        );
    }

    #[test]
    fn empty_directory_yields_no_programs() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_programs(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_programs(&dir.path().join("absent")).is_err());
    }
}
