//! Command-line driver for the VRAM march-test simulator.

use clap as _;
use tracing_subscriber as _;

/// `ADDR:BIT:KIND` fault specifications.
pub mod fault_spec;
/// Test-program argument resolution and loading.
pub mod source;
/// Memory setup and paced program execution.
pub mod session;

#[cfg(test)]
use tempfile as _;
