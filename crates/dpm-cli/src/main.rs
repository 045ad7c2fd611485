//! # dpm CLI
//!
//! Command-line interface for the defect-prediction mining pipeline.
//!
//! This binary provides human-friendly access to `dpm-core` functionality.
//! Run `dpm --help` for usage information.

mod cli;
pub mod ui;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
