//! CLI entry point for the `vram-march` binary.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use march_cli::fault_spec::FaultSpec;
use march_cli::session::{run_program, MemorySetup, RunOptions};
use march_cli::source::load_program;
use march_core::{discover_programs, FaultConfig, FaultKind, StepPacing, Status, TestProgram};
#[cfg(test)]
use tempfile as _;
use tracing_subscriber::EnvFilter;

/// Fault-aware VRAM march-test simulator
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List the test programs in a directory
    List {
        /// Directory searched for test programs
        #[arg(long, default_value = "res")]
        program_dir: PathBuf,
    },

    /// Print a test program in canonical notation
    Show {
        /// Program file, or program name inside --program-dir
        program: String,

        /// Directory searched for test programs
        #[arg(long, default_value = "res")]
        program_dir: PathBuf,
    },

    /// Run a test program and print its report
    Run {
        /// Program file, or program name inside --program-dir
        program: String,

        /// Directory searched for test programs
        #[arg(long, default_value = "res")]
        program_dir: PathBuf,

        /// Memory size in words (default 16)
        #[arg(short, long)]
        words: Option<usize>,

        /// Fault configuration file (JSON)
        #[arg(long)]
        faults: Option<PathBuf>,

        /// Extra fault as ADDR:BIT:KIND (repeatable)
        #[arg(long = "fault", value_name = "ADDR:BIT:KIND")]
        extra_faults: Vec<FaultSpec>,

        /// Pace execution at this many operations per minute
        #[arg(long, value_name = "OPS_PER_MIN")]
        rate: Option<u32>,

        /// Print every step result
        #[arg(long)]
        steps: bool,
    },

    /// Print the contents of a fault configuration file
    Faults {
        /// Fault configuration file (JSON)
        file: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::List { program_dir } => list_programs(&program_dir, &mut out)?,
        Commands::Show {
            program,
            program_dir,
        } => {
            let loaded = load_program(&program, &program_dir)?;
            show_program(&loaded.name, &loaded.program, &mut out)?;
        }
        Commands::Run {
            program,
            program_dir,
            words,
            faults,
            extra_faults,
            rate,
            steps,
        } => {
            let loaded = load_program(&program, &program_dir)?;
            let setup = MemorySetup {
                words,
                config: faults,
                faults: extra_faults,
            };
            let mut memory = setup.build()?;
            let pacing = rate
                .map(StepPacing::new)
                .transpose()
                .context("invalid --rate")?;
            let options = RunOptions {
                pacing,
                show_steps: steps,
            };
            let status = run_program(&loaded.name, &loaded.program, &mut memory, options, &mut out)?;
            if status == Status::Fail {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Faults { file } => {
            let config = FaultConfig::load(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            print_fault_config(&config, &mut out)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn list_programs(dir: &Path, out: &mut impl Write) -> Result<()> {
    let entries = discover_programs(dir)
        .with_context(|| format!("failed to list test programs in {}", dir.display()))?;
    if entries.is_empty() {
        writeln!(out, "no test programs in {}", dir.display())?;
        return Ok(());
    }
    for entry in entries {
        match TestProgram::load(&entry.path) {
            Ok(program) => writeln!(
                out,
                "{:<24} {} phases, {}N",
                entry.name,
                program.phases.len(),
                program.operations_per_address()
            )?,
            Err(err) => {
                tracing::warn!(path = %entry.path.display(), %err, "skipping unreadable test program");
                writeln!(out, "{:<24} (invalid: {err})", entry.name)?;
            }
        }
    }
    Ok(())
}

fn show_program(name: &str, program: &TestProgram, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{name}")?;
    writeln!(out, "{program}")?;
    writeln!(
        out,
        "{} phases, {} operations per address",
        program.phases.len(),
        program.operations_per_address()
    )?;
    Ok(())
}

fn print_fault_config(config: &FaultConfig, out: &mut impl Write) -> Result<()> {
    writeln!(out, "ram_size_words: {}", config.ram_size_words)?;
    writeln!(out, "faults: {}", config.faults.len())?;
    for record in &config.faults {
        let note = if record.kind.parse::<FaultKind>().is_ok() {
            ""
        } else {
            " (unknown, ignored)"
        };
        writeln!(
            out,
            "  0x{:04X} bit {:>2} {}{note}",
            record.addr, record.bit, record.kind
        )?;
    }
    Ok(())
}
