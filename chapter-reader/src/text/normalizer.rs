//! Whitespace normalization ahead of heading detection.

/// Characters rewritten to a plain space.
const SPACE_LIKE: &[char] = &[
    '\u{00a0}', // Non-breaking space
    '\t',
];

/// Normalize raw text for segmentation.
///
/// Non-breaking spaces and tabs become spaces, CRLF becomes LF, and the
/// result is trimmed. Applying it twice gives the same result as once.
pub fn normalize_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pending_cr = 0usize;

    for c in text.chars() {
        if c == '\r' {
            pending_cr += 1;
            continue;
        }

        // Carriage returns directly before a newline collapse into it
        if c != '\n' {
            result.extend(std::iter::repeat_n('\r', pending_cr));
        }
        pending_cr = 0;

        if SPACE_LIKE.contains(&c) {
            result.push(' ');
        } else {
            result.push(c);
        }
    }
    result.extend(std::iter::repeat_n('\r', pending_cr));

    result.trim().to_string()
}
