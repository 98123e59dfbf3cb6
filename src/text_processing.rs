//! # Text Processing Module
//!
//! Character-aware helpers for user input and bot replies:
//!
//! - truncation of over-long user input
//! - splitting long replies into chunks that fit a platform message
//! - short previews for log lines
//!
//! All lengths are counted in characters, not bytes, since most of the text
//! handled by the bot is Cyrillic.

/// Suffix appended to truncated input
pub const TRUNCATION_SUFFIX: &str = "...";

/// Shorten `input` to `max_chars` characters plus [`TRUNCATION_SUFFIX`].
///
/// Returns `None` when the input already fits.
pub fn truncate_input(input: &str, max_chars: usize) -> Option<String> {
    let (idx, _) = input.char_indices().nth(max_chars)?;
    Some(format!("{}{}", &input[..idx], TRUNCATION_SUFFIX))
}

/// First `max_chars` characters of `text`, with `...` if anything was cut
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Split `text` into chunks of at most `max_len` characters.
///
/// A chunk ends at the last newline inside the window, otherwise at the last
/// space, otherwise exactly at `max_len`. Whitespace at the start of the next
/// chunk is dropped.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut parts = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let limit = match rest.char_indices().nth(max_len) {
            Some((idx, _)) => idx,
            None => {
                parts.push(rest.to_string());
                break;
            }
        };

        let window = &rest[..limit];
        let split = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&idx| idx > 0)
            .unwrap_or(limit);

        parts.push(rest[..split].to_string());
        rest = rest[split..].trim_start();
    }

    parts
}
