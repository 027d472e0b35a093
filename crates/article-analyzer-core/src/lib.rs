//! # Article Analyzer Core
//!
//! Shared, WASM-safe logic for Article Analyzer: data models, whitespace
//! normalization, chunking, the in-memory passage index, cosine retrieval,
//! answer composition, summarization passes, article analysis, and the
//! collaborator traits that stand in for pretrained models.
//!
//! This crate contains no tokio, HTTP client, filesystem I/O, or other
//! native-only dependencies. Model backends live in the `article-analyzer`
//! app crate and are passed in through [`provider::ModelSet`].
//!
//! ## Data Flow
//!
//! ```text
//! documents ──▶ normalize ──▶ chunk ──▶ build_index ──▶ CorpusIndex
//!                                                          │
//! question ───────────────────────▶ retrieve ◀─────────────┘
//!                                      │
//!                                      ▼
//!                               answer_question ──▶ RetrievalResult
//! ```

pub mod analysis;
pub mod answer;
pub mod chunk;
pub mod embedding;
pub mod index;
pub mod models;
pub mod normalize;
pub mod provider;
pub mod search;
pub mod summarize;

#[cfg(test)]
pub(crate) mod testing;
