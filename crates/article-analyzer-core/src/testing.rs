//! Deterministic stub collaborators shared by the unit tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::models::Document;
use crate::provider::{
    Embedder, EntityMention, EntityRecognizer, ModelSet, QaAnswer, QuestionAnswerer,
    SentimentClassifier, SentimentPrediction, Summarizer,
};

pub const STUB_DIMS: usize = 64;

pub fn doc(id: &str, name: &str, text: &str) -> Document {
    Document {
        id: id.to_string(),
        name: name.to_string(),
        text: text.to_string(),
    }
}

fn fnv1a(token: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in token.bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Bag-of-words embedder: each lowercase word adds 1.0 to a hashed bucket.
/// Texts containing `poison` make the whole call fail.
#[derive(Default)]
pub struct BagOfWordsEmbedder {
    pub calls: AtomicUsize,
}

impl BagOfWordsEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; STUB_DIMS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = (fnv1a(&token.to_lowercase()) % STUB_DIMS as u64) as usize;
            v[bucket] += 1.0;
        }
        v
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for BagOfWordsEmbedder {
    fn model_name(&self) -> &str {
        "bag-of-words"
    }
    fn dims(&self) -> usize {
        STUB_DIMS
    }
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if texts.iter().any(|t| t.contains("poison")) {
            bail!("embedding backend rejected the batch");
        }
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

/// Embedder that always fails.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model_name(&self) -> &str {
        "failing"
    }
    fn dims(&self) -> usize {
        STUB_DIMS
    }
    async fn encode(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        bail!("embedding service unavailable")
    }
}

/// QA stub that answers from a script, but only with spans that occur
/// verbatim in the context.
pub struct ScriptedQa {
    pub answers: Vec<(String, String)>,
    pub contexts: Mutex<Vec<String>>,
}

impl ScriptedQa {
    pub fn new(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(q, a)| (q.to_string(), a.to_string()))
                .collect(),
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn seen_contexts(&self) -> Vec<String> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuestionAnswerer for ScriptedQa {
    async fn answer(&self, question: &str, context: &str) -> Result<QaAnswer> {
        self.contexts.lock().unwrap().push(context.to_string());
        let answer = self
            .answers
            .iter()
            .find(|(q, _)| q == question)
            .map(|(_, a)| a.clone())
            .filter(|a| context.contains(a.as_str()))
            .unwrap_or_default();
        Ok(QaAnswer {
            answer,
            score: Some(0.9),
        })
    }
}

pub struct FailingQa;

#[async_trait]
impl QuestionAnswerer for FailingQa {
    async fn answer(&self, _question: &str, _context: &str) -> Result<QaAnswer> {
        bail!("qa model crashed")
    }
}

/// Summarizer that records every call and returns `output_len` copies of
/// `'s'` for calls whose `max_length` is `chunk_max`, and a short fixed
/// string otherwise.
pub struct RecordingSummarizer {
    pub chunk_max: usize,
    pub output_len: usize,
    pub calls: Mutex<Vec<(usize, usize, usize)>>,
}

impl RecordingSummarizer {
    pub fn new(chunk_max: usize, output_len: usize) -> Self {
        Self {
            chunk_max,
            output_len,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(input_chars, max_length, min_length)` per call.
    pub fn calls(&self) -> Vec<(usize, usize, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for RecordingSummarizer {
    async fn summarize(&self, text: &str, max_length: usize, min_length: usize) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((text.chars().count(), max_length, min_length));
        if max_length == self.chunk_max {
            Ok("s".repeat(self.output_len))
        } else {
            Ok(format!("compressed({})", max_length))
        }
    }
}

pub struct FailingSummarizer;

#[async_trait]
impl Summarizer for FailingSummarizer {
    async fn summarize(&self, _text: &str, _max: usize, _min: usize) -> Result<String> {
        bail!("summarizer out of memory")
    }
}

/// Sentiment stub: fixed prediction, counting calls.
pub struct FixedSentiment {
    pub label: String,
    pub score: f32,
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl FixedSentiment {
    pub fn new(label: &str, score: f32) -> Self {
        Self {
            label: label.to_string(),
            score,
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("positive", 1.0)
        }
    }
}

#[async_trait]
impl SentimentClassifier for FixedSentiment {
    async fn classify(&self, _text: &str) -> Result<SentimentPrediction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("classifier timed out");
        }
        Ok(SentimentPrediction {
            label: self.label.clone(),
            score: self.score,
        })
    }
}

/// NER stub: every capitalized word is an entity; words ending in `Inc`
/// are organizations, everything else a location.
pub struct CapitalizedNer;

#[async_trait]
impl EntityRecognizer for CapitalizedNer {
    async fn recognize(&self, text: &str) -> Result<Vec<EntityMention>> {
        Ok(text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().next().is_some_and(|c| c.is_uppercase()))
            .map(|w| EntityMention {
                word: format!(" {} ", w),
                entity_group: if w.ends_with("Inc") { "ORG" } else { "LOC" }.to_string(),
                score: Some(0.99),
            })
            .collect())
    }
}

pub fn stub_models(
    embedder: Arc<dyn Embedder>,
    summarizer: Arc<dyn Summarizer>,
    qa: Arc<dyn QuestionAnswerer>,
    sentiment: Arc<dyn SentimentClassifier>,
) -> ModelSet {
    ModelSet {
        embedder,
        summarizer,
        qa,
        sentiment,
        ner: Arc::new(CapitalizedNer),
    }
}
