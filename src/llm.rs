//! Chat-model client backing the text collaborators.
//!
//! One [`LlmClient`] implements [`Summarizer`], [`QuestionAnswerer`],
//! [`SentimentClassifier`] and [`EntityRecognizer`]: each task sends a
//! short instruction plus the text and asks for a JSON reply, which is
//! parsed into the core's types.
//!
//! Backends:
//! - **OpenAI** chat completions (`POST /v1/chat/completions`, JSON mode).
//! - **Ollama** chat (`POST /api/chat`, `format: "json"`).
//!
//! Question answering stays extractive: an answer that does not occur
//! verbatim in the context is discarded.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use article_analyzer_core::provider::{
    EntityMention, EntityRecognizer, QaAnswer, QuestionAnswerer, SentimentClassifier,
    SentimentPrediction, Summarizer,
};

use crate::config::LlmConfig;
use crate::http;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";

const SUMMARY_PROMPT: &str = "You summarize news articles and reports. \
Write a faithful, neutral summary of the user's text using between {min} and {max} words. \
Reply with JSON only: {\"summary\": \"...\"}";

const QA_PROMPT: &str = "You answer questions by extraction. \
Find the shortest span of the context that answers the question and copy it exactly, \
character for character. If the context does not contain the answer, use an empty string. \
Reply with JSON only: {\"answer\": \"...\", \"score\": <confidence between 0 and 1>}";

const SENTIMENT_PROMPT: &str = "You classify the overall sentiment of a text. \
Reply with JSON only: {\"label\": \"positive\" | \"negative\" | \"neutral\", \
\"score\": <confidence between 0 and 1>}";

const NER_PROMPT: &str = "You extract named entities. \
List every person (PER), organization (ORG), location (LOC) and other named entity (MISC) \
exactly as written in the text. \
Reply with JSON only: {\"entities\": [{\"word\": \"...\", \"entity_group\": \"PER\" | \"ORG\" | \"LOC\" | \"MISC\", \
\"score\": <confidence between 0 and 1>}]}";

#[derive(Debug, Clone, PartialEq)]
enum Backend {
    OpenAI { api_key: String },
    Ollama,
}

pub struct LlmClient {
    backend: Backend,
    base_url: String,
    model: String,
    temperature: f32,
    max_retries: u32,
    client: reqwest::Client,
}

impl LlmClient {
    /// # Errors
    ///
    /// Fails for a provider other than `openai` or `ollama`, and for
    /// `openai` when `OPENAI_API_KEY` is not set.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let (backend, default_url) = match config.provider.as_str() {
            "openai" => {
                let api_key = std::env::var("OPENAI_API_KEY")
                    .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
                (Backend::OpenAI { api_key }, OPENAI_BASE_URL)
            }
            "ollama" => (Backend::Ollama, OLLAMA_BASE_URL),
            other => bail!("LlmClient does not support provider '{}'", other),
        };
        let base_url = config
            .url
            .clone()
            .unwrap_or_else(|| default_url.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            backend,
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }

    /// Send one system + user exchange and return the reply text.
    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let messages = serde_json::json!([
            {"role": "system", "content": system},
            {"role": "user", "content": user},
        ]);

        match &self.backend {
            Backend::OpenAI { api_key } => {
                let body = serde_json::json!({
                    "model": self.model,
                    "messages": messages,
                    "temperature": self.temperature,
                    "response_format": {"type": "json_object"},
                });
                let url = format!("{}/v1/chat/completions", self.base_url);
                let json = http::post_json(
                    &self.client,
                    &url,
                    Some(api_key),
                    &body,
                    self.max_retries,
                    "OpenAI",
                )
                .await?;
                openai_content(&json)
            }
            Backend::Ollama => {
                let body = serde_json::json!({
                    "model": self.model,
                    "messages": messages,
                    "stream": false,
                    "format": "json",
                    "options": {"temperature": self.temperature},
                });
                let url = format!("{}/api/chat", self.base_url);
                let json =
                    http::post_json(&self.client, &url, None, &body, self.max_retries, "Ollama")
                        .await?;
                ollama_content(&json)
            }
        }
    }

    async fn chat_json<T: DeserializeOwned>(&self, system: &str, user: &str) -> Result<T> {
        let reply = self.chat(system, user).await?;
        parse_reply(&reply)
    }
}

fn openai_content(json: &serde_json::Value) -> Result<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Invalid OpenAI response: missing choices[0].message.content"))
}

fn ollama_content(json: &serde_json::Value) -> Result<String> {
    json.pointer("/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Invalid Ollama response: missing message.content"))
}

/// Parse a JSON object out of a model reply, tolerating code fences and
/// prose around it.
fn parse_reply<T: DeserializeOwned>(reply: &str) -> Result<T> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    let object = match (start, end) {
        (Some(s), Some(e)) if s < e => &reply[s..=e],
        _ => bail!("model reply contains no JSON object: {:?}", reply),
    };
    serde_json::from_str(object).with_context(|| format!("unexpected model reply: {}", object))
}

/// Keep `answer` only if it is a span of `context`.
fn keep_extractive(answer: &str, context: &str) -> String {
    let answer = answer.trim();
    if !answer.is_empty() && context.contains(answer) {
        answer.to_string()
    } else {
        String::new()
    }
}

#[derive(Deserialize)]
struct SummaryReply {
    summary: String,
}

#[derive(Deserialize)]
struct SentimentReply {
    label: String,
    #[serde(default)]
    score: f32,
}

#[derive(Deserialize)]
struct EntitiesReply {
    #[serde(default)]
    entities: Vec<EntityMention>,
}

#[async_trait]
impl Summarizer for LlmClient {
    async fn summarize(&self, text: &str, max_length: usize, min_length: usize) -> Result<String> {
        let system = SUMMARY_PROMPT
            .replace("{min}", &min_length.to_string())
            .replace("{max}", &max_length.to_string());
        let reply: SummaryReply = self.chat_json(&system, text).await?;
        Ok(reply.summary)
    }
}

#[async_trait]
impl QuestionAnswerer for LlmClient {
    async fn answer(&self, question: &str, context: &str) -> Result<QaAnswer> {
        let user = format!("Question: {}\n\nContext:\n{}", question, context);
        let reply: QaAnswer = self.chat_json(QA_PROMPT, &user).await?;
        let answer = keep_extractive(&reply.answer, context);
        if answer.is_empty() && !reply.answer.trim().is_empty() {
            tracing::debug!(answer = %reply.answer, "discarded answer not found in context");
        }
        Ok(QaAnswer {
            answer,
            score: reply.score.map(|s| s.clamp(0.0, 1.0)),
        })
    }
}

#[async_trait]
impl SentimentClassifier for LlmClient {
    async fn classify(&self, text: &str) -> Result<SentimentPrediction> {
        let reply: SentimentReply = self.chat_json(SENTIMENT_PROMPT, text).await?;
        Ok(SentimentPrediction {
            label: reply.label,
            score: reply.score.clamp(0.0, 1.0),
        })
    }
}

#[async_trait]
impl EntityRecognizer for LlmClient {
    async fn recognize(&self, text: &str) -> Result<Vec<EntityMention>> {
        let reply: EntitiesReply = self.chat_json(NER_PROMPT, text).await?;
        Ok(reply.entities)
    }
}

/// Stand-in for every text collaborator when `llm.provider = "disabled"`.
pub struct DisabledLlm;

const DISABLED: &str = "LLM provider is disabled";

#[async_trait]
impl Summarizer for DisabledLlm {
    async fn summarize(&self, _text: &str, _max_length: usize, _min_length: usize) -> Result<String> {
        bail!(DISABLED)
    }
}

#[async_trait]
impl QuestionAnswerer for DisabledLlm {
    async fn answer(&self, _question: &str, _context: &str) -> Result<QaAnswer> {
        bail!(DISABLED)
    }
}

#[async_trait]
impl SentimentClassifier for DisabledLlm {
    async fn classify(&self, _text: &str) -> Result<SentimentPrediction> {
        bail!(DISABLED)
    }
}

#[async_trait]
impl EntityRecognizer for DisabledLlm {
    async fn recognize(&self, _text: &str) -> Result<Vec<EntityMention>> {
        bail!(DISABLED)
    }
}
