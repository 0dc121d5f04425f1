//! Identifier sanitizing for Digital Twin names.

/// Convert a display string into an identifier token.
///
/// Works on UTF-8 bytes. `len` is a buffer length including the terminator,
/// so the result holds at most `len - 1` bytes. Every byte outside
/// `[A-Za-z0-9_]` becomes `_`, so a non-ASCII character becomes one `_` per
/// byte of its encoding.
pub fn sanitize_identifier(display: &str, len: usize) -> String {
    display
        .bytes()
        .take(len.saturating_sub(1))
        .map(|b| {
            if b.is_ascii_alphanumeric() || b == b'_' {
                char::from(b)
            } else {
                '_'
            }
        })
        .collect()
}
