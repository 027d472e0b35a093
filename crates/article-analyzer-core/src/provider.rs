//! Model collaborator traits.
//!
//! The pipeline treats pretrained models as black boxes behind these
//! traits. Implementations (HTTP APIs, local ONNX models, test stubs) live
//! outside this crate and are handed to each operation through a
//! [`ModelSet`], which a session acquires once and holds for its lifetime.
//!
//! All methods are async (via `async-trait`) so that both blocking local
//! models and remote APIs fit behind the same interface.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Turns texts into fixed-dimension vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"all-minilm-l6-v2"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts, returning one vector per input in input
    /// order. Vectors should be L2-normalized; the core re-normalizes them
    /// regardless.
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Abstractive summarizer with length bounds.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `text` into roughly `min_length..=max_length` tokens.
    async fn summarize(&self, text: &str, max_length: usize, min_length: usize) -> Result<String>;
}

/// Answer produced by an extractive-QA model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaAnswer {
    /// A span of the context, or empty when nothing matched.
    pub answer: String,
    #[serde(default)]
    pub score: Option<f32>,
}

/// Extractive question answering over a context string.
#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    async fn answer(&self, question: &str, context: &str) -> Result<QaAnswer>;
}

/// Raw output of a sentiment classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentPrediction {
    /// Label as reported by the model (any case).
    pub label: String,
    pub score: f32,
}

#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<SentimentPrediction>;
}

/// Raw entity mention as reported by a NER model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMention {
    pub word: String,
    pub entity_group: String,
    #[serde(default)]
    pub score: Option<f32>,
}

#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    async fn recognize(&self, text: &str) -> Result<Vec<EntityMention>>;
}

/// The full set of model collaborators for one session.
///
/// Cheap to clone; every collaborator is shared behind an [`Arc`].
#[derive(Clone)]
pub struct ModelSet {
    pub embedder: Arc<dyn Embedder>,
    pub summarizer: Arc<dyn Summarizer>,
    pub qa: Arc<dyn QuestionAnswerer>,
    pub sentiment: Arc<dyn SentimentClassifier>,
    pub ner: Arc<dyn EntityRecognizer>,
}
