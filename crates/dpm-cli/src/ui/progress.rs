//! Progress indicators for long-running CLI operations.
//!
//! Provides the spinner `dpm run`/`dpm extract` show while mining a project,
//! using `indicatif`. The spinner respects color settings and is disabled
//! when stdout is not a TTY or when `--quiet` mode is enabled.
//!
//! # Design
//!
//! - `ProgressMode`: Determines whether the spinner is shown (interactive,
//!   quiet, silent)
//! - `Progress`: A single spinner, hidden outside interactive mode

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

use super::color::ColorMode;

/// Progress feedback mode based on output context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// Interactive TTY: show an animated spinner
    Interactive,
    /// Non-TTY or quiet: suppress the spinner, show only final results
    Quiet,
    /// Machine-readable: no progress at all (for --json)
    Silent,
}

impl ProgressMode {
    /// Detect the appropriate mode from environment and flags.
    pub fn detect(quiet: bool, json: bool, color_mode: ColorMode) -> Self {
        let is_tty = std::io::stdout().is_terminal();
        if json {
            Self::Silent
        } else if quiet || !is_tty {
            Self::Quiet
        } else if color_mode.is_enabled() || is_tty {
            Self::Interactive
        } else {
            Self::Quiet
        }
    }

    /// Check if the spinner should be shown.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Interactive)
    }
}

/// Spinner tick characters (Braille-based).
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// A spinner that wraps indicatif, hidden outside interactive mode.
pub struct Progress {
    bar: ProgressBar,
    mode: ProgressMode,
}

impl Progress {
    /// Create a spinner for one pipeline project run.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let progress = Progress::spinner("Mining Lang...", mode);
    /// // ... run the pipeline ...
    /// progress.finish_ok("Mined Lang: 12 releases, 340 records");
    /// ```
    pub fn spinner(message: &str, mode: ProgressMode) -> Self {
        let bar = if mode.is_interactive() {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .tick_chars(SPINNER_CHARS)
                    .template("{spinner:.cyan} {msg} ({elapsed})")
                    .expect("valid template"),
            );
            pb.set_message(message.to_string());
            pb.enable_steady_tick(Duration::from_millis(80));
            pb
        } else {
            // Hidden progress bar for quiet/silent mode
            ProgressBar::hidden()
        };

        Self { bar, mode }
    }

    /// Finish with a message (replaces the spinner line).
    pub fn finish_with_message(&self, message: &str) {
        if self.mode.is_interactive() {
            self.bar.finish_and_clear();
        }
        if !message.is_empty() {
            println!("{}", message);
        }
    }

    /// Finish indicating success (convenience for common pattern).
    pub fn finish_ok(&self, message: &str) {
        self.finish_with_message(message);
    }

    /// Finish indicating error (convenience for common pattern).
    pub fn finish_err(&self, message: &str) {
        self.finish_with_message(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_mode_detection() {
        // JSON mode always silent
        assert_eq!(
            ProgressMode::detect(false, true, ColorMode::Auto),
            ProgressMode::Silent
        );

        // Quiet mode
        assert_eq!(
            ProgressMode::detect(true, false, ColorMode::Auto),
            ProgressMode::Quiet
        );
    }

    #[test]
    fn test_progress_mode_is_interactive() {
        assert!(ProgressMode::Interactive.is_interactive());
        assert!(!ProgressMode::Quiet.is_interactive());
        assert!(!ProgressMode::Silent.is_interactive());
    }

    #[test]
    fn test_progress_spinner_quiet_mode_does_not_panic() {
        let progress = Progress::spinner("Testing...", ProgressMode::Quiet);
        progress.finish_ok("done");
    }
}
