//! Text formatting utilities for CLI output.

/// Truncate a string to a maximum length with ellipsis.
///
/// If the string is longer than `max_len`, it is truncated and `...` is appended.
/// The total output length will be exactly `max_len` characters.
///
/// # Examples
///
/// ```
/// use dpm_cli::ui::format::truncate_str;
///
/// assert_eq!(truncate_str("hello", 10), "hello");
/// assert_eq!(truncate_str("hello world", 8), "hello...");
/// ```
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        ".".repeat(max_len)
    } else {
        // Handle Unicode properly by using char indices
        let mut end = 0;
        for (i, (idx, _)) in s.char_indices().enumerate() {
            if i >= max_len - 3 {
                break;
            }
            end = idx;
        }
        // Get the next char boundary
        let truncate_at = s[end..]
            .char_indices()
            .nth(1)
            .map(|(i, _)| end + i)
            .unwrap_or(end);
        format!("{}...", &s[..truncate_at])
    }
}
