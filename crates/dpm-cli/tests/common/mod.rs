//! Shared test utilities for dpm-cli integration tests.

use assert_cmd::Command;

/// Get a Command for the `dpm` binary.
///
/// # Panics
///
/// Panics if the `dpm` binary cannot be found. This should not happen
/// in a properly configured test environment.
pub fn dpm_cmd() -> Command {
    Command::cargo_bin("dpm").expect("dpm binary should exist")
}
