//! Chunked summarization of single documents and of the whole corpus.
//!
//! # Document pass
//!
//! 1. Normalize and chunk at summarization granularity (2000 / 200).
//! 2. Summarize every chunk independently with `chunk_*_length` bounds.
//! 3. Join the chunk summaries with a space.
//! 4. If the result is longer than `compress_threshold` characters, cut it
//!    to `compress_input_cap` characters and summarize it once more with
//!    the larger `compress_*_length` bounds.
//!
//! A document is therefore summarized in at most two passes.
//!
//! # Corpus pass
//!
//! Per-document summaries are joined, capped at `corpus_input_cap`
//! characters, and summarized exactly once.
//!
//! Collaborator failures never propagate: the result becomes a visible
//! marker (see [`error_marker`]) so one bad document cannot block the rest.

use anyhow::Result;

use crate::chunk::{chunk_with, ChunkParams};
use crate::normalize::{normalize_whitespace, truncate_chars};
use crate::provider::Summarizer;

const ERROR_MARKER_PREFIX: &str = "[summary unavailable: ";

/// Summarization thresholds and length bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryParams {
    pub chunk: ChunkParams,
    pub chunk_max_length: usize,
    pub chunk_min_length: usize,
    /// Joined chunk summaries longer than this trigger compression.
    pub compress_threshold: usize,
    /// Characters of the joined summary fed to the compression pass.
    pub compress_input_cap: usize,
    pub compress_max_length: usize,
    pub compress_min_length: usize,
    /// Characters of the joined document summaries fed to the corpus pass.
    pub corpus_input_cap: usize,
    pub corpus_max_length: usize,
    pub corpus_min_length: usize,
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            chunk: ChunkParams::SUMMARY,
            chunk_max_length: 160,
            chunk_min_length: 50,
            compress_threshold: 2500,
            compress_input_cap: 8000,
            compress_max_length: 220,
            compress_min_length: 80,
            corpus_input_cap: 12000,
            corpus_max_length: 260,
            corpus_min_length: 90,
        }
    }
}

/// Marker text standing in for a summary that could not be produced.
pub fn error_marker(err: &anyhow::Error) -> String {
    format!("{}{:#}]", ERROR_MARKER_PREFIX, err)
}

/// Whether `summary` is a marker produced by [`error_marker`].
pub fn is_error_marker(summary: &str) -> bool {
    summary.starts_with(ERROR_MARKER_PREFIX)
}

/// Summarize one document, propagating collaborator errors.
///
/// Empty text (after normalization) returns an empty string without
/// calling the summarizer.
pub async fn try_summarize_document<S: Summarizer + ?Sized>(
    summarizer: &S,
    text: &str,
    params: &SummaryParams,
) -> Result<String> {
    let text = normalize_whitespace(text);
    if text.is_empty() {
        return Ok(String::new());
    }

    let chunks = chunk_with(&text, params.chunk);
    let mut summaries = Vec::with_capacity(chunks.len());
    for chunk in chunks.iter().filter(|c| !c.is_empty()) {
        let summary = summarizer
            .summarize(chunk, params.chunk_max_length, params.chunk_min_length)
            .await?;
        summaries.push(summary.trim().to_string());
    }

    let merged = summaries.join(" ");
    let merged_chars = merged.chars().count();
    if merged_chars <= params.compress_threshold {
        return Ok(merged);
    }

    tracing::debug!(
        chunks = chunks.len(),
        merged_chars,
        "compressing joined chunk summaries"
    );
    let capped = truncate_chars(&merged, params.compress_input_cap);
    let compressed = summarizer
        .summarize(capped, params.compress_max_length, params.compress_min_length)
        .await?;
    Ok(compressed.trim().to_string())
}

/// Summarize one document; failures become an [`error_marker`].
pub async fn summarize_document<S: Summarizer + ?Sized>(
    summarizer: &S,
    text: &str,
    params: &SummaryParams,
) -> String {
    match try_summarize_document(summarizer, text, params).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!("summarization failed: {:#}", e);
            error_marker(&e)
        }
    }
}

/// Summarize the corpus from its per-document summaries.
///
/// Blank summaries and error markers are left out. With nothing left the
/// result is empty and the summarizer is not called; otherwise it is called
/// exactly once. Failures become an [`error_marker`].
pub async fn summarize_corpus<S: Summarizer + ?Sized>(
    summarizer: &S,
    summaries: &[String],
    params: &SummaryParams,
) -> String {
    let joined = summaries
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && !is_error_marker(s))
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        return String::new();
    }

    let capped = truncate_chars(&joined, params.corpus_input_cap);
    match summarizer
        .summarize(capped, params.corpus_max_length, params.corpus_min_length)
        .await
    {
        Ok(summary) => summary.trim().to_string(),
        Err(e) => {
            tracing::warn!("corpus summarization failed: {:#}", e);
            error_marker(&e)
        }
    }
}
