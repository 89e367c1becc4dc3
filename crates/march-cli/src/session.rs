//! A single `run`: memory setup, optional pacing, step output and report.

use std::io::Write;
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use anyhow::Context;
use march_core::{
    AutoStepper, ErrorSummary, FaultConfig, Report, Status, StepPacing, StepResult, TestProgram,
    TestRunner, Vram,
};

use crate::fault_spec::FaultSpec;

/// How the memory for a run is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySetup {
    /// Word count used when no configuration file is given.
    pub words: Option<usize>,
    /// Fault configuration file; its size wins over `words`.
    pub config: Option<PathBuf>,
    /// Extra faults applied after the configuration.
    pub faults: Vec<FaultSpec>,
}

impl MemorySetup {
    /// Builds a fresh memory.
    ///
    /// # Errors
    ///
    /// Fails when the configuration cannot be loaded, the size is invalid or
    /// a fault does not fit.
    pub fn build(&self) -> anyhow::Result<Vram> {
        let mut memory = if let Some(path) = &self.config {
            if self.words.is_some() {
                tracing::warn!("--words is ignored when --faults supplies the memory size");
            }
            FaultConfig::load(path)
                .and_then(|config| config.build_vram())
                .with_context(|| format!("failed to apply fault configuration {}", path.display()))?
        } else {
            let words = self.words.unwrap_or(march_core::DEFAULT_WORD_COUNT);
            Vram::new(words).context("invalid memory size")?
        };
        for spec in &self.faults {
            spec.apply(&mut memory)
                .with_context(|| format!("cannot inject fault {spec}"))?;
        }
        tracing::info!(
            words = memory.word_count(),
            faults = memory.fault_count(),
            "memory prepared"
        );
        Ok(memory)
    }
}

/// Run-time behavior of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Pace steps at this rate instead of running flat out.
    pub pacing: Option<StepPacing>,
    /// Print every step result.
    pub show_steps: bool,
}

/// Runs `program` to completion against `memory`, writing step lines (if
/// requested) and the report for `name` to `out`.
///
/// # Errors
///
/// Fails only when `out` cannot be written.
pub fn run_program(
    name: &str,
    program: &TestProgram,
    memory: &mut Vram,
    options: RunOptions,
    out: &mut impl Write,
) -> anyhow::Result<Status> {
    let mut runner = TestRunner::new(program, memory);
    let mut stepper = options.pacing.map(AutoStepper::new);
    let origin = Instant::now();
    if let Some(stepper) = &mut stepper {
        stepper.start(origin.elapsed());
    }

    loop {
        if let Some(stepper) = &mut stepper {
            if !stepper.poll(origin.elapsed()) {
                if let Some(wait) = stepper.time_until_due(origin.elapsed()) {
                    thread::sleep(wait);
                }
                continue;
            }
        }
        let result = runner.step();
        if result.is_ended() {
            break;
        }
        if options.show_steps {
            writeln!(out, "{}", describe_step(result))?;
        }
    }
    if let Some(stepper) = &mut stepper {
        stepper.stop();
    }

    let summary = ErrorSummary::from_errors(runner.detected_errors());
    write!(out, "{}", Report::new(name, &summary))?;
    Ok(summary.status())
}

/// One-line rendering of a step result.
#[must_use]
pub fn describe_step(result: StepResult) -> String {
    match result {
        StepResult::Write { address } => format!("WRITE        0x{address:04X}"),
        StepResult::CheckOk { address } => format!("CHECK_OK     0x{address:04X}"),
        StepResult::CheckFailed { address } => format!("CHECK_FAILED 0x{address:04X}"),
        StepResult::Ended => "ENDED".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use march_core::{
        FaultConfig, FaultKind, Status, StepPacing, StepResult, TestProgram, Vram,
        MAX_OPS_PER_MINUTE,
    };

    use super::{describe_step, run_program, MemorySetup, RunOptions};

    #[test]
    fn setup_defaults_to_sixteen_fault_free_words() {
        let memory = MemorySetup::default().build().unwrap();
        assert_eq!(memory.word_count(), 16);
        assert_eq!(memory.fault_count(), 0);
    }

    #[test]
    fn setup_layers_cli_faults_over_a_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faults.json");
        let mut seeded = Vram::new(8).unwrap();
        seeded.set_error(1, 1, FaultKind::StuckAt0).unwrap();
        FaultConfig::from_vram(&seeded).save(&path).unwrap();

        let setup = MemorySetup {
            words: Some(64),
            config: Some(path),
            faults: vec!["2:4:STUCK_AT_1".parse().unwrap()],
        };
        let memory = setup.build().unwrap();
        assert_eq!(memory.word_count(), 8);
        assert_eq!(memory.get_error(1, 1), Ok(FaultKind::StuckAt0));
        assert_eq!(memory.get_error(2, 4), Ok(FaultKind::StuckAt1));
    }

    #[test]
    fn setup_rejects_out_of_range_faults() {
        let setup = MemorySetup {
            words: Some(4),
            config: None,
            faults: vec!["9:0:STUCK_AT_1".parse().unwrap()],
        };
        assert!(setup.build().is_err());
    }

    #[test]
    fn setup_rejects_a_malformed_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faults.json");
        fs::write(&path, "{ not json").unwrap();
        let setup = MemorySetup {
            config: Some(path),
            ..MemorySetup::default()
        };
        assert!(setup.build().is_err());
    }

    #[test]
    fn run_prints_steps_and_report() {
        let program = TestProgram::parse("up(w1); up(r1)").unwrap();
        let mut memory = Vram::new(2).unwrap();
        memory.set_error(1, 0, FaultKind::StuckAt0).unwrap();
        let mut out = Vec::new();

        let status = run_program(
            "tiny",
            &program,
            &mut memory,
            RunOptions {
                pacing: None,
                show_steps: true,
            },
            &mut out,
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(status, Status::Fail);
        assert!(text.starts_with(
            "WRITE        0x0000\nWRITE        0x0001\nCHECK_OK     0x0000\nCHECK_FAILED 0x0001\n"
        ));
        assert!(text.contains("Test        : tiny\n"));
        assert!(text.contains("1. 0x0001\n"));
    }

    #[test]
    fn paced_run_reaches_the_same_verdict() {
        let program = TestProgram::parse("up(w0,r0)").unwrap();
        let mut memory = Vram::new(1).unwrap();
        let mut out = Vec::new();
        let options = RunOptions {
            pacing: Some(StepPacing::new(MAX_OPS_PER_MINUTE).unwrap()),
            show_steps: false,
        };
        let status = run_program("paced", &program, &mut memory, options, &mut out).unwrap();
        assert_eq!(status, Status::Pass);
        assert!(String::from_utf8(out).unwrap().ends_with("No errors detected.\n"));
    }

    #[test]
    fn step_lines_name_the_result() {
        assert_eq!(describe_step(StepResult::Ended), "ENDED");
        assert_eq!(
            describe_step(StepResult::CheckOk { address: 0x3FF }),
            "CHECK_OK     0x03FF"
        );
    }
}
