//! Whitespace normalization applied before chunking, embedding and
//! summarization.

/// Collapse every run of whitespace (spaces, tabs, newlines, any Unicode
/// whitespace, and the ASCII separators `\x1c`..=`\x1f`) to a single ASCII
/// space and trim both ends.
///
/// Total and idempotent: `normalize_whitespace(normalize_whitespace(x)) ==
/// normalize_whitespace(x)`.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split(is_space).filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

fn is_space(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}

/// Return at most the first `max_chars` characters of `text`.
///
/// Cuts on a character boundary, never inside a multi-byte sequence.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
