//! Per-article analysis and the corpus roll-up.
//!
//! Each document gets a summary ([`crate::summarize`]), a sentiment
//! label and a de-duplicated entity list. The corpus report adds a global
//! summary, the sentiment distribution and the most frequent entities.
//!
//! Like the rest of the pipeline, a failing collaborator only degrades the
//! affected field; it never aborts the report.

use std::collections::{BTreeMap, HashMap, HashSet};

use futures::stream::{self, StreamExt};

use crate::models::{
    ArticleReport, CorpusReport, Document, Entity, EntityCount, Sentiment, SentimentLabel,
};
use crate::normalize::{normalize_whitespace, truncate_chars};
use crate::provider::{EntityRecognizer, ModelSet, SentimentClassifier};
use crate::summarize::{summarize_corpus, summarize_document, SummaryParams};

/// How raw classifier output becomes a document sentiment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentPolicy {
    /// Characters of normalized text sent to the classifier.
    pub sample_chars: usize,
    /// `negative` predictions scoring below this are reported as `neutral`.
    pub negative_softening_threshold: f32,
}

impl Default for SentimentPolicy {
    fn default() -> Self {
        Self {
            sample_chars: 5000,
            negative_softening_threshold: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisParams {
    pub summary: SummaryParams,
    pub sentiment: SentimentPolicy,
    /// Characters of normalized text sent to the entity recognizer.
    pub entity_sample_chars: usize,
    /// Length of [`CorpusReport::top_entities`].
    pub top_entities: usize,
    /// Documents analyzed at the same time.
    pub concurrency: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            summary: SummaryParams::default(),
            sentiment: SentimentPolicy::default(),
            entity_sample_chars: 8000,
            top_entities: 15,
            concurrency: 4,
        }
    }
}

/// Classify the sentiment of `text`.
///
/// Empty text is neutral without a classifier call. Weak negatives are
/// softened to neutral. A classifier failure yields
/// [`SentimentLabel::Unavailable`].
pub async fn analyze_sentiment<C: SentimentClassifier + ?Sized>(
    classifier: &C,
    text: &str,
    policy: &SentimentPolicy,
) -> Sentiment {
    let text = normalize_whitespace(text);
    if text.is_empty() {
        return Sentiment::neutral();
    }

    let sample = truncate_chars(&text, policy.sample_chars);
    let prediction = match classifier.classify(sample).await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("sentiment classification failed: {:#}", e);
            return Sentiment::unavailable();
        }
    };

    let mut label = SentimentLabel::parse(&prediction.label);
    if label == SentimentLabel::Negative && prediction.score < policy.negative_softening_threshold {
        label = SentimentLabel::Neutral;
    }
    Sentiment {
        label,
        score: prediction.score,
    }
}

/// Recognize named entities in `text`, de-duplicated on `(text, label)`
/// in first-seen order.
pub async fn extract_entities<R: EntityRecognizer + ?Sized>(
    recognizer: &R,
    text: &str,
    sample_chars: usize,
) -> Vec<Entity> {
    let text = normalize_whitespace(text);
    if text.is_empty() {
        return Vec::new();
    }

    let mentions = match recognizer.recognize(truncate_chars(&text, sample_chars)).await {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!("entity recognition failed: {:#}", e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut entities = Vec::new();
    for mention in mentions {
        let entity = Entity {
            text: mention.word.trim().to_string(),
            label: mention.entity_group.trim().to_string(),
        };
        if entity.text.is_empty() {
            continue;
        }
        if seen.insert(entity.clone()) {
            entities.push(entity);
        }
    }
    entities
}

/// Summary, sentiment and entities for one document.
pub async fn analyze_document(
    models: &ModelSet,
    document: &Document,
    params: &AnalysisParams,
) -> ArticleReport {
    let summary = summarize_document(models.summarizer.as_ref(), &document.text, &params.summary).await;
    let sentiment = analyze_sentiment(models.sentiment.as_ref(), &document.text, &params.sentiment).await;
    let entities = extract_entities(models.ner.as_ref(), &document.text, params.entity_sample_chars).await;

    tracing::debug!(
        document = %document.name,
        sentiment = %sentiment.label,
        entities = entities.len(),
        "analyzed document"
    );

    ArticleReport {
        id: document.id.clone(),
        name: document.name.clone(),
        summary,
        sentiment,
        entities,
        chars: document.text.chars().count(),
    }
}

/// Number of articles per sentiment label, ordered by label.
pub fn sentiment_distribution(articles: &[ArticleReport]) -> BTreeMap<SentimentLabel, usize> {
    let mut counts = BTreeMap::new();
    for article in articles {
        *counts.entry(article.sentiment.label).or_insert(0) += 1;
    }
    counts
}

/// The `limit` most mentioned entities across `articles`.
///
/// Ranked by count (desc), then entity text, then label.
pub fn top_entities(articles: &[ArticleReport], limit: usize) -> Vec<EntityCount> {
    let mut counts: HashMap<&Entity, usize> = HashMap::new();
    for entity in articles.iter().flat_map(|a| a.entities.iter()) {
        *counts.entry(entity).or_insert(0) += 1;
    }

    let mut ranked: Vec<EntityCount> = counts
        .into_iter()
        .map(|(entity, count)| EntityCount {
            text: entity.text.clone(),
            label: entity.label.clone(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.text.cmp(&b.text))
            .then_with(|| a.label.cmp(&b.label))
    });
    ranked.truncate(limit);
    ranked
}

/// Analyze every document and roll the results up into a corpus report.
///
/// Up to `params.concurrency` documents are in flight at once; reports are
/// returned in input order regardless.
pub async fn analyze_corpus(
    models: &ModelSet,
    documents: &[Document],
    params: &AnalysisParams,
) -> CorpusReport {
    let articles: Vec<ArticleReport> = stream::iter(documents)
        .map(|doc| analyze_document(models, doc, params))
        .buffered(params.concurrency.max(1))
        .collect()
        .await;

    let summaries: Vec<String> = articles.iter().map(|a| a.summary.clone()).collect();
    let global_summary = summarize_corpus(models.summarizer.as_ref(), &summaries, &params.summary).await;

    let report = CorpusReport {
        sentiment_counts: sentiment_distribution(&articles),
        top_entities: top_entities(&articles, params.top_entities),
        global_summary,
        articles,
    };
    tracing::info!(articles = report.articles.len(), "corpus analysis complete");
    report
}
