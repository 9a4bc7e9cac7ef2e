//! Terminal output sanitization
//!
//! Participant names and message excerpts come straight from a chat export
//! and can contain escape sequences or control characters. Anything from the
//! transcript that is printed in table output goes through [`sanitize_cell`].

/// Strips ANSI CSI escape sequences and control characters except tab,
/// newline and carriage return.
///
/// # Examples
///
/// ```
/// use chat_birthdays::utils::terminal::strip_ansi_codes;
///
/// let text = "\x1b[31mSarah\x1b[0m";
/// assert_eq!(strip_ansi_codes(text), "Sarah");
/// ```
pub fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // CSI ends at the first letter
            for next_ch in chars.by_ref() {
                if next_ch.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }

        if ch.is_control() && ch != '\t' && ch != '\n' && ch != '\r' {
            continue;
        }

        result.push(ch);
    }

    result
}

/// Prepare transcript text for a single table cell: escapes removed, line
/// breaks flattened, and the result cut to `max_chars` with an ellipsis.
pub fn sanitize_cell(text: &str, max_chars: usize) -> String {
    let stripped = strip_ansi_codes(text);
    let flat = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
