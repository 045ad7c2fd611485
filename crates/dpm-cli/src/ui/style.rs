//! Message styling for `dpm`'s CLI output.
//!
//! Provides consistent prefixes, colors, and formatting for all CLI messages.
//!
//! ## Message Types
//!
//! | Prefix | Meaning | Color |
//! |--------|---------|-------|
//! | `[ok]` | Success | Green |
//! | `[err]` | Error | Red |
//! | `[warn]` | Warning | Yellow |
//! | `[info]` | Information | Blue |
//! | `[hint]` | Suggestion | Cyan |
//! | `[skip]` | Skipped | Dim |

use owo_colors::OwoColorize;

use super::color::ColorMode;

/// Message severity/type for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Success - operation completed successfully
    Ok,
    /// Error - operation failed, cannot continue
    Err,
    /// Warning - operation succeeded with caveats
    Warn,
    /// Information - neutral status or progress update
    Info,
    /// Hint - actionable next step or tip
    Hint,
    /// Skipped - item was intentionally not processed
    Skip,
}

impl MessageType {
    /// Returns the prefix text for this message type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Ok => "[ok]",
            Self::Err => "[err]",
            Self::Warn => "[warn]",
            Self::Info => "[info]",
            Self::Hint => "[hint]",
            Self::Skip => "[skip]",
        }
    }
}

/// Main styling interface for CLI output.
///
/// The Style struct provides methods to format messages, sections, and other
/// CLI output elements with consistent styling.
///
/// # Example
///
/// ```
/// use dpm_cli::ui::{Style, MessageType, ColorMode};
///
/// let style = Style::new(ColorMode::Never);
/// println!("{}", style.message(MessageType::Ok, "Operation completed"));
/// ```
#[derive(Debug, Clone)]
pub struct Style {
    color_mode: ColorMode,
}

impl Style {
    /// Create a Style instance with an explicit color mode.
    ///
    /// Useful for testing or when the CLI provides a `--color` flag.
    pub fn new(color_mode: ColorMode) -> Self {
        Self { color_mode }
    }

    /// Check if colors are enabled.
    fn colors_enabled(&self) -> bool {
        self.color_mode.is_enabled()
    }

    /// Format a simple message with a type prefix.
    ///
    /// # Example
    ///
    /// ```
    /// use dpm_cli::ui::{Style, MessageType, ColorMode};
    ///
    /// let style = Style::new(ColorMode::Never);
    /// assert_eq!(
    ///     style.message(MessageType::Ok, "Done"),
    ///     "[ok] Done"
    /// );
    /// ```
    pub fn message(&self, msg_type: MessageType, text: &str) -> String {
        let prefix = msg_type.prefix();
        if self.colors_enabled() {
            let colored_prefix = match msg_type {
                MessageType::Ok => prefix.green().to_string(),
                MessageType::Err => prefix.red().to_string(),
                MessageType::Warn => prefix.yellow().to_string(),
                MessageType::Info => prefix.blue().to_string(),
                MessageType::Hint => prefix.cyan().to_string(),
                MessageType::Skip => prefix.dimmed().to_string(),
            };
            format!("{} {}", colored_prefix, text)
        } else {
            format!("{} {}", prefix, text)
        }
    }

    /// Format a detail line with 5-space indentation.
    ///
    /// Use this for multi-line messages where details follow the main message.
    ///
    /// # Example
    ///
    /// ```
    /// use dpm_cli::ui::{Style, ColorMode};
    ///
    /// let style = Style::new(ColorMode::Never);
    /// assert_eq!(
    ///     style.message_detail("Indexed", "14 sources"),
    ///     "     Indexed: 14 sources"
    /// );
    /// ```
    pub fn message_detail(&self, label: &str, value: &str) -> String {
        format!("     {}: {}", label, value)
    }

    /// Format a section header.
    ///
    /// Creates a simple header like: `STATUS`
    ///
    /// # Example
    ///
    /// ```
    /// use dpm_cli::ui::{Style, ColorMode};
    ///
    /// let style = Style::new(ColorMode::Never);
    /// let header = style.section("STATUS");
    /// assert_eq!(header, "STATUS");
    /// ```
    pub fn section(&self, title: &str) -> String {
        if self.colors_enabled() {
            title.bold().to_string()
        } else {
            title.to_string()
        }
    }

    /// Format a structured error with optional cause and hint.
    ///
    /// # Example
    ///
    /// ```
    /// use dpm_cli::ui::{Style, ColorMode};
    ///
    /// let style = Style::new(ColorMode::Never);
    /// let output = style.error_with_context(
    ///     "Failed to connect",
    ///     Some("Connection refused"),
    ///     Some("Check if the server is running"),
    /// );
    /// assert!(output.contains("[err] Failed to connect"));
    /// assert!(output.contains("Cause: Connection refused"));
    /// assert!(output.contains("Hint: Check if the server is running"));
    /// ```
    pub fn error_with_context(
        &self,
        msg: &str,
        cause: Option<&str>,
        hint: Option<&str>,
    ) -> String {
        let mut output = self.message(MessageType::Err, msg);

        if let Some(cause_text) = cause {
            output.push('\n');
            output.push_str(&format!("      Cause: {}", cause_text));
        }

        if let Some(hint_text) = hint {
            output.push('\n');
            output.push_str(&format!("      Hint: {}", hint_text));
        }

        output
    }
}
