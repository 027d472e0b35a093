//! Core data models that flow through the indexing, retrieval and analysis
//! pipeline.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Number of hex characters kept from the content hash as a document id.
pub const DOCUMENT_ID_LEN: usize = 12;

/// One uploaded document with its extracted text.
///
/// Created once at ingestion and never mutated. The `id` is derived from
/// the file name and raw bytes (see [`document_id`]), so uploading the same
/// file twice yields the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub text: String,
}

impl Document {
    /// Build a document from an upload: its name, raw bytes, and the text
    /// extracted from those bytes.
    pub fn from_upload(name: &str, raw: &[u8], text: String) -> Self {
        Self {
            id: document_id(name, raw),
            name: name.to_string(),
            text,
        }
    }
}

/// Stable content hash of a document: SHA-256 over `name ‖ raw`, truncated
/// to [`DOCUMENT_ID_LEN`] lowercase hex characters.
pub fn document_id(name: &str, raw: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(raw);
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(DOCUMENT_ID_LEN);
    hex
}

/// A bounded chunk of a document's text, the atomic unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Id of the owning [`Document`].
    pub document_id: String,
    /// Display name of the owning document.
    pub name: String,
    /// Position of this chunk within its document (0-based).
    pub ordinal: usize,
    /// Full chunk text.
    pub text: String,
    /// Bounded prefix of `text` for display.
    pub snippet: String,
}

/// A passage borrowed from an index together with its similarity score.
#[derive(Debug, Clone, Copy)]
pub struct ScoredPassage<'a> {
    /// Position of the passage in the index.
    pub index: usize,
    /// Cosine similarity between the question and the passage.
    pub score: f32,
    pub passage: &'a Passage,
}

/// Outcome of a retrieval-augmented question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResult {
    /// Extracted answer, or the no-answer sentinel.
    pub answer: String,
    /// Passages used as context, best first.
    pub supporting_passages: Vec<Passage>,
    /// Similarity score of each supporting passage (parallel to
    /// `supporting_passages`).
    pub similarities: Vec<f32>,
    /// Score reported by the extractive-QA collaborator, if any.
    pub confidence: Option<f32>,
    /// `false` when the sentinel was substituted.
    pub answered: bool,
}

/// Sentiment class of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    /// The classifier failed or returned a label outside the known set.
    Unavailable,
}

impl SentimentLabel {
    /// Map a raw classifier label (case-insensitive) to a known class.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "positive" | "pos" => SentimentLabel::Positive,
            "negative" | "neg" => SentimentLabel::Negative,
            "neutral" => SentimentLabel::Neutral,
            _ => SentimentLabel::Unavailable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document-level sentiment after the softening policy was applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    /// Classifier confidence in `[0.0, 1.0]`.
    pub score: f32,
}

impl Sentiment {
    pub fn neutral() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0.0,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            label: SentimentLabel::Unavailable,
            score: 0.0,
        }
    }
}

/// A named entity mention, de-duplicated per document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    /// Entity group, e.g. `PER`, `ORG`, `LOC`, `MISC`.
    pub label: String,
}

/// Per-document analysis result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleReport {
    pub id: String,
    pub name: String,
    pub summary: String,
    pub sentiment: Sentiment,
    pub entities: Vec<Entity>,
    /// Character count of the document text.
    pub chars: usize,
}

/// How often an entity was mentioned across the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityCount {
    pub text: String,
    pub label: String,
    pub count: usize,
}

/// Corpus-wide roll-up of all article reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusReport {
    /// One report per document, in input order.
    pub articles: Vec<ArticleReport>,
    pub global_summary: String,
    /// Number of articles per sentiment label.
    pub sentiment_counts: BTreeMap<SentimentLabel, usize>,
    /// Most frequently mentioned entities, most frequent first.
    pub top_entities: Vec<EntityCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_is_stable() {
        let a = document_id("report.txt", b"hello");
        let b = document_id("report.txt", b"hello");
        assert_eq!(a, b);
        assert_eq!(a.len(), DOCUMENT_ID_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_document_id_depends_on_name_and_bytes() {
        let base = document_id("report.txt", b"hello");
        assert_ne!(base, document_id("other.txt", b"hello"));
        assert_ne!(base, document_id("report.txt", b"hello!"));
    }

    #[test]
    fn test_from_upload() {
        let doc = Document::from_upload("a.txt", b"raw", "text".to_string());
        assert_eq!(doc.id, document_id("a.txt", b"raw"));
        assert_eq!(doc.name, "a.txt");
        assert_eq!(doc.text, "text");
    }

    #[test]
    fn test_sentiment_label_parse() {
        assert_eq!(SentimentLabel::parse("POSITIVE"), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::parse(" Negative "), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::parse("neutral"), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::parse("LABEL_7"), SentimentLabel::Unavailable);
    }

    #[test]
    fn test_sentiment_label_serializes_lowercase() {
        let json = serde_json::to_string(&SentimentLabel::Negative).unwrap();
        assert_eq!(json, "\"negative\"");
    }
}
