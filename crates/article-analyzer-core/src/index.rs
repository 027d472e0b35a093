//! In-memory passage index for one analysis session.
//!
//! [`build_index`] chunks every document at retrieval granularity, embeds
//! all passages in a single [`Embedder::encode`] call, and stores passage
//! metadata and unit vectors as parallel arrays inside a [`CorpusIndex`].
//!
//! The index is immutable once built. It is `Send + Sync`, so concurrent
//! queries can share it without locking. Changing the document set means
//! building a new index.
//!
//! # Failure handling
//!
//! Embedding failures never abort the batch. When the corpus-wide call
//! fails, each document is retried on its own; documents that still fail
//! contribute no passages and are listed in [`CorpusIndex::failures`].

use anyhow::{bail, Result};
use serde::Serialize;

use crate::chunk::{chunk_with, ChunkParams};
use crate::embedding::{is_unit, l2_normalize};
use crate::models::{Document, Passage};
use crate::normalize::truncate_chars;
use crate::provider::Embedder;

/// Appended to snippets that were cut short.
pub const SNIPPET_ELLIPSIS: &str = "...";

/// Indexing parameters, decoupled from application config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexParams {
    /// Retrieval chunk size and overlap.
    pub chunk: ChunkParams,
    /// Characters kept in each passage snippet.
    pub snippet_chars: usize,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            chunk: ChunkParams::RETRIEVAL,
            snippet_chars: 360,
        }
    }
}

/// A document that contributed no passages because embedding failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexFailure {
    pub document_id: String,
    pub name: String,
    pub reason: String,
}

/// Passages and their embeddings, aligned by position.
///
/// `passages()[i]` and `embeddings()[i]` always describe the same chunk,
/// every embedding has unit length, and all embeddings share
/// [`dims`](CorpusIndex::dims).
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    passages: Vec<Passage>,
    embeddings: Vec<Vec<f32>>,
    dims: usize,
    failures: Vec<IndexFailure>,
}

impl CorpusIndex {
    /// An index with no passages.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assemble an index from already-embedded passages.
    ///
    /// # Errors
    ///
    /// Fails if the two arrays differ in length, if the vectors do not all
    /// share one dimension, or if any vector is not unit length.
    pub fn from_parts(passages: Vec<Passage>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if passages.len() != embeddings.len() {
            bail!(
                "passage/embedding count mismatch: {} passages, {} embeddings",
                passages.len(),
                embeddings.len()
            );
        }
        let dims = embeddings.first().map(|v| v.len()).unwrap_or(0);
        for (i, v) in embeddings.iter().enumerate() {
            if v.len() != dims {
                bail!("embedding {} has {} dims, expected {}", i, v.len(), dims);
            }
            if !is_unit(v) {
                bail!("embedding {} is not unit length", i);
            }
        }
        Ok(Self {
            passages,
            embeddings,
            dims,
            failures: Vec::new(),
        })
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    /// Vector dimensionality (0 for an empty index).
    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Documents skipped because their embeddings could not be computed.
    pub fn failures(&self) -> &[IndexFailure] {
        &self.failures
    }

    /// Iterate over `(passage, vector)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&Passage, &[f32])> {
        self.passages
            .iter()
            .zip(self.embeddings.iter().map(|v| v.as_slice()))
    }

    /// Number of distinct documents with at least one passage.
    pub fn document_count(&self) -> usize {
        let mut ids: Vec<&str> = self.passages.iter().map(|p| p.document_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}

/// Build a display snippet: the first `max_chars` characters, plus
/// [`SNIPPET_ELLIPSIS`] when the text is longer.
pub fn make_snippet(text: &str, max_chars: usize) -> String {
    let head = truncate_chars(text, max_chars);
    if head.len() < text.len() {
        format!("{}{}", head, SNIPPET_ELLIPSIS)
    } else {
        head.to_string()
    }
}

/// Chunk one document into passages, skipping empty chunks.
pub fn passages_for(document: &Document, params: &IndexParams) -> Vec<Passage> {
    chunk_with(&document.text, params.chunk)
        .into_iter()
        .filter(|c| !c.is_empty())
        .enumerate()
        .map(|(ordinal, text)| Passage {
            document_id: document.id.clone(),
            name: document.name.clone(),
            ordinal,
            snippet: make_snippet(&text, params.snippet_chars),
            text,
        })
        .collect()
}

/// Embed texts and L2-normalize the result, validating its shape.
///
/// # Errors
///
/// Fails if the collaborator fails, returns the wrong number of vectors,
/// returns vectors of differing dimension, or returns a vector that cannot
/// be normalized.
pub async fn embed_normalized<E: Embedder + ?Sized>(
    embedder: &E,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }
    let mut vectors = embedder.encode(texts).await?;
    if vectors.len() != texts.len() {
        bail!(
            "embedder returned {} vectors for {} texts",
            vectors.len(),
            texts.len()
        );
    }
    let dims = vectors[0].len();
    for (i, v) in vectors.iter_mut().enumerate() {
        if v.len() != dims {
            bail!("embedding {} has {} dims, expected {}", i, v.len(), dims);
        }
        l2_normalize(v).map_err(|e| anyhow::anyhow!("embedding {}: {}", i, e))?;
    }
    Ok(vectors)
}

/// Build the corpus index for a batch of documents.
///
/// All passages are embedded through one `encode` call. If that call
/// fails, documents are embedded one at a time and the ones that still
/// fail are recorded in [`CorpusIndex::failures`] instead of aborting.
///
/// Documents whose text is empty after normalization contribute no
/// passages.
pub async fn build_index<E: Embedder + ?Sized>(
    embedder: &E,
    documents: &[Document],
    params: &IndexParams,
) -> CorpusIndex {
    let per_doc: Vec<Vec<Passage>> = documents.iter().map(|d| passages_for(d, params)).collect();
    let total: usize = per_doc.iter().map(|p| p.len()).sum();

    if total == 0 {
        tracing::debug!(documents = documents.len(), "no passages to index");
        return CorpusIndex::empty();
    }

    let texts: Vec<String> = per_doc
        .iter()
        .flatten()
        .map(|p| p.text.clone())
        .collect();

    match embed_normalized(embedder, &texts).await {
        Ok(embeddings) => {
            let dims = embeddings[0].len();
            let passages: Vec<Passage> = per_doc.into_iter().flatten().collect();
            tracing::info!(
                documents = documents.len(),
                passages = passages.len(),
                dims,
                model = embedder.model_name(),
                "built corpus index"
            );
            CorpusIndex {
                passages,
                embeddings,
                dims,
                failures: Vec::new(),
            }
        }
        Err(e) => {
            tracing::warn!(
                "corpus embedding call failed, retrying per document: {:#}",
                e
            );
            build_per_document(embedder, documents, per_doc).await
        }
    }
}

async fn build_per_document<E: Embedder + ?Sized>(
    embedder: &E,
    documents: &[Document],
    per_doc: Vec<Vec<Passage>>,
) -> CorpusIndex {
    let mut index = CorpusIndex::empty();

    for (document, passages) in documents.iter().zip(per_doc) {
        if passages.is_empty() {
            continue;
        }
        let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
        let result = embed_normalized(embedder, &texts).await.and_then(|vectors| {
            if index.dims != 0 && vectors[0].len() != index.dims {
                bail!(
                    "embedding has {} dims, expected {}",
                    vectors[0].len(),
                    index.dims
                );
            }
            Ok(vectors)
        });

        match result {
            Ok(vectors) => {
                index.dims = vectors[0].len();
                index.passages.extend(passages);
                index.embeddings.extend(vectors);
            }
            Err(e) => {
                tracing::warn!(
                    document = %document.name,
                    "skipping document, embedding failed: {:#}",
                    e
                );
                index.failures.push(IndexFailure {
                    document_id: document.id.clone(),
                    name: document.name.clone(),
                    reason: format!("{:#}", e),
                });
            }
        }
    }

    tracing::info!(
        passages = index.passages.len(),
        failed_documents = index.failures.len(),
        "built corpus index with per-document embedding"
    );
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::l2_norm;
    use crate::testing::{doc, BagOfWordsEmbedder, FailingEmbedder, STUB_DIMS};

    fn long_text(topic: &str, sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("The {} report, part {}, covers supply and demand in detail.", topic, i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_snippet_short_text_unchanged() {
        assert_eq!(make_snippet("short", 360), "short");
    }

    #[test]
    fn test_snippet_truncates_with_marker() {
        let text = "x".repeat(400);
        let snippet = make_snippet(&text, 360);
        assert_eq!(snippet.len(), 363);
        assert!(snippet.ends_with(SNIPPET_ELLIPSIS));
    }

    #[test]
    fn test_snippet_exact_length_has_no_marker() {
        let text = "y".repeat(360);
        assert_eq!(make_snippet(&text, 360), text);
    }

    #[test]
    fn test_passages_keep_document_then_chunk_order() {
        let docs = vec![
            doc("a", "a.txt", &long_text("grain", 40)),
            doc("b", "b.txt", "Short note."),
        ];
        let params = IndexParams::default();
        let passages: Vec<Passage> = docs.iter().flat_map(|d| passages_for(d, &params)).collect();
        assert!(passages.len() > 2);
        let last = passages.last().unwrap();
        assert_eq!(last.document_id, "b");
        assert_eq!(last.ordinal, 0);
        let a_ordinals: Vec<usize> = passages
            .iter()
            .filter(|p| p.document_id == "a")
            .map(|p| p.ordinal)
            .collect();
        assert_eq!(a_ordinals, (0..a_ordinals.len()).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_build_index_parallel_arrays() {
        let embedder = BagOfWordsEmbedder::default();
        let docs = vec![
            doc("a", "a.txt", &long_text("grain", 40)),
            doc("b", "b.txt", &long_text("steel", 25)),
        ];
        let index = build_index(&embedder, &docs, &IndexParams::default()).await;
        assert!(!index.is_empty());
        assert_eq!(index.passages().len(), index.embeddings().len());
        assert_eq!(index.dims(), STUB_DIMS);
        assert_eq!(index.document_count(), 2);
        assert!(index.failures().is_empty());
        for v in index.embeddings() {
            assert!((l2_norm(v) - 1.0).abs() < 1e-5);
        }
        assert_eq!(embedder.call_count(), 1, "one encode call per corpus");
    }

    #[tokio::test]
    async fn test_build_index_passages_belong_to_batch() {
        let embedder = BagOfWordsEmbedder::default();
        let docs = vec![
            doc("a", "a.txt", &long_text("grain", 40)),
            doc("b", "b.txt", "Short note."),
            doc("c", "c.txt", " "),
        ];
        let index = build_index(&embedder, &docs, &IndexParams::default()).await;
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert!(index
            .passages()
            .iter()
            .all(|p| ids.contains(&p.document_id.as_str())));
        assert_eq!(index.document_count(), 2);
    }

    #[tokio::test]
    async fn test_build_index_skips_empty_documents() {
        let embedder = BagOfWordsEmbedder::default();
        let docs = vec![doc("a", "a.txt", "  \n\t "), doc("b", "b.txt", "Real text here.")];
        let index = build_index(&embedder, &docs, &IndexParams::default()).await;
        assert_eq!(index.len(), 1);
        assert_eq!(index.passages()[0].document_id, "b");
        assert!(index.failures().is_empty());
    }

    #[tokio::test]
    async fn test_build_index_no_documents() {
        let embedder = BagOfWordsEmbedder::default();
        let index = build_index(&embedder, &[], &IndexParams::default()).await;
        assert!(index.is_empty());
        assert_eq!(index.dims(), 0);
        assert_eq!(embedder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_build_index_is_idempotent() {
        let embedder = BagOfWordsEmbedder::default();
        let docs = vec![
            doc("a", "a.txt", &long_text("grain", 30)),
            doc("b", "b.txt", "Another document about shipping."),
        ];
        let first = build_index(&embedder, &docs, &IndexParams::default()).await;
        let second = build_index(&embedder, &docs, &IndexParams::default()).await;
        assert_eq!(first.passages(), second.passages());
        for (x, y) in first.embeddings().iter().zip(second.embeddings()) {
            for (a, b) in x.iter().zip(y) {
                assert!((a - b).abs() < 1e-6);
            }
        }
    }

    #[tokio::test]
    async fn test_failed_document_is_isolated() {
        let embedder = BagOfWordsEmbedder::default();
        let docs = vec![
            doc("a", "a.txt", "Healthy document about harbours."),
            doc("p", "p.txt", "This one contains poison."),
            doc("c", "c.txt", "Another healthy document about rivers."),
        ];
        let index = build_index(&embedder, &docs, &IndexParams::default()).await;
        assert_eq!(index.len(), 2);
        assert_eq!(index.passages()[0].document_id, "a");
        assert_eq!(index.passages()[1].document_id, "c");
        assert_eq!(index.failures().len(), 1);
        assert_eq!(index.failures()[0].document_id, "p");
        assert_eq!(index.passages().len(), index.embeddings().len());
        // one corpus call + three per-document calls
        assert_eq!(embedder.call_count(), 4);
    }

    #[tokio::test]
    async fn test_all_documents_fail() {
        let docs = vec![doc("a", "a.txt", "one"), doc("b", "b.txt", "two")];
        let index = build_index(&FailingEmbedder, &docs, &IndexParams::default()).await;
        assert!(index.is_empty());
        assert_eq!(index.failures().len(), 2);
    }

    #[tokio::test]
    async fn test_zero_vector_is_an_embedding_failure() {
        let embedder = BagOfWordsEmbedder::default();
        // Only punctuation: no tokens, so the bag-of-words vector is zero.
        let docs = vec![doc("z", "z.txt", "!!! ???"), doc("a", "a.txt", "words")];
        let index = build_index(&embedder, &docs, &IndexParams::default()).await;
        assert_eq!(index.len(), 1);
        assert_eq!(index.failures()[0].document_id, "z");
    }

    #[test]
    fn test_from_parts_validates() {
        let p = Passage {
            document_id: "a".into(),
            name: "a".into(),
            ordinal: 0,
            text: "t".into(),
            snippet: "t".into(),
        };
        assert!(CorpusIndex::from_parts(vec![p.clone()], vec![]).is_err());
        assert!(CorpusIndex::from_parts(vec![p.clone()], vec![vec![2.0, 0.0]]).is_err());
        assert!(CorpusIndex::from_parts(
            vec![p.clone(), p.clone()],
            vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]]
        )
        .is_err());
        let index = CorpusIndex::from_parts(vec![p], vec![vec![0.0, 1.0]]).unwrap();
        assert_eq!(index.dims(), 2);
        assert_eq!(index.embeddings()[0], vec![0.0, 1.0]);
        assert_eq!(index.passages().len(), 1);
    }
}
