//! Shared utility functions.

/// Marker appended to output that was cut at the policy cap.
pub const TRUNCATION_MARKER: &str = "\n... [output truncated]";

/// Truncate a string to approximately `max_bytes` without splitting a UTF-8
/// character boundary.
///
/// Returns a sub-slice of the original string. If the string is shorter than
/// `max_bytes`, the entire string is returned unchanged.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Cap `s` at `max_bytes`, appending [`TRUNCATION_MARKER`] when anything
/// was cut. The result is never longer than `max_bytes + TRUNCATION_MARKER.len()`.
pub fn cap_with_marker(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut out = truncate_str(s, max_bytes).to_string();
    out.push_str(TRUNCATION_MARKER);
    out
}
