//! Sentence-aware sliding-window text chunker.
//!
//! Splits normalized text into overlapping [`String`] chunks of at most
//! `max_chars` characters. The same routine serves two granularities:
//! small chunks for retrieval (see [`crate::index`]) and large chunks for
//! summarization (see [`crate::summarize`]).
//!
//! # Algorithm
//!
//! 1. Normalize whitespace ([`normalize_whitespace`]).
//! 2. If the text fits in `max_chars`, return it as the only chunk.
//! 3. Otherwise slide a window `[start, start + max_chars)` over the text.
//! 4. When the window does not reach the end of the text, retract its right
//!    edge to just after the last `.` inside the window, but only if that
//!    keeps more than [`MIN_SENTENCE_CHUNK`] characters before the period.
//!    Otherwise keep the hard cut.
//! 5. Start the next window `overlap` characters before the previous end.
//!
//! All lengths are counted in characters (Unicode scalar values), so a
//! multi-byte character is never split.
//!
//! # Example
//!
//! ```rust
//! use article_analyzer_core::chunk::chunk_text;
//!
//! let chunks = chunk_text("Hello   world.\n\nSecond line.", 900, 120);
//! assert_eq!(chunks, vec!["Hello world. Second line.".to_string()]);
//! ```

use crate::normalize::normalize_whitespace;

/// A sentence retraction is only accepted when the period sits more than
/// this many characters after the window start.
pub const MIN_SENTENCE_CHUNK: usize = 300;

/// Chunk size and overlap for one chunking granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    /// Maximum characters per chunk.
    pub max_chars: usize,
    /// Characters shared by consecutive chunks.
    pub overlap: usize,
}

impl ChunkParams {
    /// Retrieval granularity: 900 characters, 120 overlap.
    pub const RETRIEVAL: ChunkParams = ChunkParams {
        max_chars: 900,
        overlap: 120,
    };

    /// Summarization granularity: 2000 characters, 200 overlap.
    pub const SUMMARY: ChunkParams = ChunkParams {
        max_chars: 2000,
        overlap: 200,
    };
}

/// Split text into overlapping chunks, preferring sentence boundaries.
///
/// # Guarantees
///
/// - At least one chunk is always returned. Text that is empty after
///   normalization yields a single empty chunk; callers must skip it
///   before embedding or summarizing.
/// - If the normalized text has at most `max_chars` characters, the only
///   chunk equals the normalized text.
/// - Every character of the normalized text is covered by some chunk and
///   chunks are produced left to right.
/// - The walk always terminates: when `overlap` would keep the next window
///   from moving forward, it advances by one character instead.
/// - A `max_chars` of zero is treated as one.
pub fn chunk_text(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    let text = normalize_whitespace(text);
    let max_chars = max_chars.max(1);
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    if len <= max_chars {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    loop {
        let mut end = (start + max_chars).min(len);

        if end < len {
            if let Some(offset) = chars[start..end].iter().rposition(|&c| c == '.') {
                if offset > MIN_SENTENCE_CHUNK {
                    end = start + offset + 1;
                }
            }
        }

        chunks.push(chars[start..end].iter().collect::<String>());

        if end >= len {
            break;
        }

        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { start + 1 };
    }

    chunks
}

/// [`chunk_text`] with a [`ChunkParams`] bundle.
pub fn chunk_with(text: &str, params: ChunkParams) -> Vec<String> {
    chunk_text(text, params.max_chars, params.overlap)
}
