//! Nearest-passage retrieval by cosine similarity.
//!
//! The retriever embeds the question with the same [`Embedder`] used to
//! build the index, scores every passage with a dot product (all vectors
//! are unit length), and returns the `top_k` best passages.
//!
//! # Ranking
//!
//! 1. Score each passage: `score = q · e_i`.
//! 2. Sort by score (desc), then passage index (asc), so ties resolve to
//!    the earlier passage and results are reproducible.
//! 3. Truncate to `top_k`.

use anyhow::{anyhow, bail, Result};

use crate::embedding::dot;
use crate::index::{embed_normalized, CorpusIndex};
use crate::models::ScoredPassage;
use crate::provider::Embedder;

/// Rank every indexed passage against a unit-length query vector.
///
/// Returns at most `top_k` passages ordered by non-increasing score.
///
/// # Errors
///
/// Fails if the query vector's dimension differs from the index's.
pub fn rank<'a>(
    index: &'a CorpusIndex,
    query_vec: &[f32],
    top_k: usize,
) -> Result<Vec<ScoredPassage<'a>>> {
    if index.is_empty() || top_k == 0 {
        return Ok(Vec::new());
    }
    if query_vec.len() != index.dims() {
        bail!(
            "query vector has {} dims, index has {}",
            query_vec.len(),
            index.dims()
        );
    }

    let mut scored: Vec<ScoredPassage<'a>> = index
        .iter()
        .enumerate()
        .map(|(i, (passage, vector))| ScoredPassage {
            index: i,
            score: dot(query_vec, vector),
            passage,
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.index.cmp(&b.index)));
    scored.truncate(top_k);

    Ok(scored)
}

/// Embed `question` and return the `top_k` most similar passages, best
/// first.
///
/// An empty index, a blank question, or `top_k == 0` return an empty list
/// without calling the embedder.
pub async fn retrieve<'a, E: Embedder + ?Sized>(
    embedder: &E,
    index: &'a CorpusIndex,
    question: &str,
    top_k: usize,
) -> Result<Vec<ScoredPassage<'a>>> {
    if index.is_empty() || top_k == 0 || question.trim().is_empty() {
        return Ok(Vec::new());
    }

    let vectors = embed_normalized(embedder, &[question.to_string()]).await?;
    let query_vec = vectors
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Empty embedding response"))?;

    let hits = rank(index, &query_vec, top_k)?;
    tracing::debug!(
        hits = hits.len(),
        best = hits.first().map(|h| h.score).unwrap_or(0.0),
        "retrieved passages"
    );
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{build_index, IndexParams};
    use crate::models::Passage;
    use crate::testing::{doc, BagOfWordsEmbedder, FailingEmbedder};

    fn passage(id: &str) -> Passage {
        Passage {
            document_id: id.to_string(),
            name: format!("{}.txt", id),
            ordinal: 0,
            text: id.to_string(),
            snippet: id.to_string(),
        }
    }

    fn fixed_index() -> CorpusIndex {
        let s = std::f32::consts::FRAC_1_SQRT_2;
        CorpusIndex::from_parts(
            vec![passage("x"), passage("diag"), passage("y"), passage("x2")],
            vec![vec![1.0, 0.0], vec![s, s], vec![0.0, 1.0], vec![1.0, 0.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_rank_orders_by_score() {
        let index = fixed_index();
        let hits = rank(&index, &[1.0, 0.0], 10).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.passage.document_id.as_str()).collect();
        assert_eq!(ids, vec!["x", "x2", "diag", "y"]);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_rank_ties_prefer_lower_index() {
        let index = fixed_index();
        let hits = rank(&index, &[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].index, 0);
        assert_eq!(hits[1].index, 3);
    }

    #[test]
    fn test_rank_truncates_to_top_k() {
        let index = fixed_index();
        assert_eq!(rank(&index, &[0.0, 1.0], 1).unwrap().len(), 1);
        assert_eq!(rank(&index, &[0.0, 1.0], 0).unwrap().len(), 0);
        assert_eq!(rank(&index, &[0.0, 1.0], 99).unwrap().len(), 4);
    }

    #[test]
    fn test_rank_dimension_mismatch() {
        let index = fixed_index();
        assert!(rank(&index, &[1.0, 0.0, 0.0], 3).is_err());
    }

    #[test]
    fn test_rank_empty_index() {
        let index = CorpusIndex::empty();
        assert!(rank(&index, &[1.0], 5).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_empty_index_skips_embedding() {
        let embedder = BagOfWordsEmbedder::default();
        let index = CorpusIndex::empty();
        let hits = retrieve(&embedder, &index, "anything?", 5).await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(embedder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_retrieve_blank_question() {
        let embedder = BagOfWordsEmbedder::default();
        let docs = vec![doc("a", "a.txt", "Some text.")];
        let index = build_index(&embedder, &docs, &IndexParams::default()).await;
        let hits = retrieve(&embedder, &index, "   ", 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_finds_relevant_passage() {
        let embedder = BagOfWordsEmbedder::default();
        let docs = vec![
            doc("f", "france.txt", "Paris is the capital of France. It is known for the Eiffel Tower."),
            doc("s", "soup.txt", "Tomato soup needs basil, garlic and slow simmering."),
            doc("b", "bikes.txt", "Bicycle chains should be oiled every few hundred kilometres."),
        ];
        let index = build_index(&embedder, &docs, &IndexParams::default()).await;
        let hits = retrieve(&embedder, &index, "What is the capital of France?", 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].passage.document_id, "f");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_retrieve_is_deterministic() {
        let embedder = BagOfWordsEmbedder::default();
        let docs = vec![
            doc("a", "a.txt", "alpha"),
            doc("b", "b.txt", "alpha"),
            doc("c", "c.txt", "omega"),
        ];
        let index = build_index(&embedder, &docs, &IndexParams::default()).await;
        let first: Vec<usize> = retrieve(&embedder, &index, "alpha", 3)
            .await
            .unwrap()
            .iter()
            .map(|h| h.index)
            .collect();
        let second: Vec<usize> = retrieve(&embedder, &index, "alpha", 3)
            .await
            .unwrap()
            .iter()
            .map(|h| h.index)
            .collect();
        assert_eq!(first, second);
        assert_eq!(&first[..2], &[0, 1]);
    }

    #[tokio::test]
    async fn test_retrieve_propagates_embedding_failure() {
        let embedder = BagOfWordsEmbedder::default();
        let docs = vec![doc("a", "a.txt", "Some text.")];
        let index = build_index(&embedder, &docs, &IndexParams::default()).await;
        assert!(retrieve(&FailingEmbedder, &index, "question", 3).await.is_err());
    }
}
