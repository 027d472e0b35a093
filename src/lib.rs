//! # Article Analyzer
//!
//! Summaries, sentiment, named entities and retrieval-augmented question
//! answering over a small corpus of uploaded documents (PDF, DOCX, HTML,
//! plain text).
//!
//! The pipeline itself (chunking, passage index, retrieval, answer
//! composition, summarization, analysis) lives in `article-analyzer-core`,
//! which has no I/O or runtime dependencies. This crate adds everything
//! around it: configuration, document loading and text extraction, the
//! embedding and LLM providers, and the `article-analyzer` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐
//! │    Loader    │──▶│   Chunker    │──▶│  Passage index   │
//! │ PDF/DOCX/... │   │  + Embedder  │   │ (unit vectors)   │
//! └──────────────┘   └──────────────┘   └────────┬─────────┘
//!        │                                       │ top-k cosine
//!        ▼                                       ▼
//! ┌──────────────┐                      ┌──────────────────┐
//! │  Summaries,  │                      │ Extractive QA    │
//! │ sentiment,   │                      │ over the context │
//! │   entities   │                      └──────────────────┘
//! └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! article-analyzer index ./articles
//! article-analyzer ask "Who founded the company?" ./articles --top-k 3
//! article-analyzer summarize ./articles
//! article-analyzer --json analyze ./articles
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`loader`] | Path walking and document loading |
//! | [`extract`] | Per-format text extraction |
//! | [`embedding`] | Embedding providers |
//! | [`llm`] | Chat-model text collaborators |
//! | [`http`] | JSON requests with retry |
//! | [`session`] | Model acquisition and corpus loading |
//! | [`index_cmd`], [`ask`], [`summarize_cmd`], [`analyze`] | CLI commands |

pub mod analyze;
pub mod ask;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod http;
pub mod index_cmd;
pub mod llm;
pub mod loader;
pub mod session;
pub mod summarize_cmd;
