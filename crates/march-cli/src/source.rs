//! Resolution of a `<PROGRAM>` argument to a test-program file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use march_core::{discover_programs, ProgramEntry, TestProgram};

/// A resolved and parsed test program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedProgram {
    /// Test identifier shown in reports.
    pub name: String,
    /// File the program was read from.
    pub path: PathBuf,
    /// Parsed program.
    pub program: TestProgram,
}

/// Locates `reference` as a file path, falling back to a program name
/// inside `program_dir`.
///
/// # Errors
///
/// Fails when neither lookup finds a file, or the directory cannot be read.
pub fn resolve_program(reference: &str, program_dir: &Path) -> anyhow::Result<ProgramEntry> {
    let direct = Path::new(reference);
    if direct.is_file() {
        let name = direct
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(reference)
            .to_string();
        return Ok(ProgramEntry {
            name,
            path: direct.to_path_buf(),
        });
    }

    let entries = discover_programs(program_dir).with_context(|| {
        format!("failed to list test programs in {}", program_dir.display())
    })?;
    if let Some(entry) = entries
        .into_iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(reference))
    {
        return Ok(entry);
    }
    bail!(
        "no test program '{reference}' (not a file, and not found in {})",
        program_dir.display()
    )
}

/// Resolves and parses `reference`.
///
/// # Errors
///
/// Fails on resolution errors, unreadable files and malformed programs.
pub fn load_program(reference: &str, program_dir: &Path) -> anyhow::Result<LoadedProgram> {
    let ProgramEntry { name, path } = resolve_program(reference, program_dir)?;
    let program = TestProgram::load(&path)
        .with_context(|| format!("failed to load test program {}", path.display()))?;
    tracing::info!(%name, path = %path.display(), "test program resolved");
    Ok(LoadedProgram {
        name,
        path,
        program,
    })
}
