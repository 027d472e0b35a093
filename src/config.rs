//! TOML configuration.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults below, so an empty file (or no file at all) is a valid
//! configuration. Values are checked by [`Config::validate`] after
//! parsing. Secrets such as `OPENAI_API_KEY` come from the environment.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use article_analyzer_core::analysis::{AnalysisParams, SentimentPolicy};
use article_analyzer_core::answer::AnswerParams;
use article_analyzer_core::chunk::ChunkParams;
use article_analyzer_core::index::IndexParams;
use article_analyzer_core::summarize::SummaryParams;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub summarization: SummarizationConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_retrieval_max_chars")]
    pub retrieval_max_chars: usize,
    #[serde(default = "default_retrieval_overlap")]
    pub retrieval_overlap: usize,
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,
    #[serde(default = "default_summary_overlap")]
    pub summary_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            retrieval_max_chars: default_retrieval_max_chars(),
            retrieval_overlap: default_retrieval_overlap(),
            summary_max_chars: default_summary_max_chars(),
            summary_overlap: default_summary_overlap(),
        }
    }
}

fn default_retrieval_max_chars() -> usize {
    ChunkParams::RETRIEVAL.max_chars
}
fn default_retrieval_overlap() -> usize {
    ChunkParams::RETRIEVAL.overlap
}
fn default_summary_max_chars() -> usize {
    ChunkParams::SUMMARY.max_chars
}
fn default_summary_overlap() -> usize {
    ChunkParams::SUMMARY.overlap
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_context_char_budget")]
    pub context_char_budget: usize,
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            context_char_budget: default_context_char_budget(),
            snippet_chars: default_snippet_chars(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_context_char_budget() -> usize {
    4500
}
fn default_snippet_chars() -> usize {
    360
}

/// Summarization bounds. Absent keys take the values of
/// [`SummaryParams::default`].
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SummarizationConfig {
    pub chunk_max_length: usize,
    pub chunk_min_length: usize,
    pub compress_threshold: usize,
    pub compress_input_cap: usize,
    pub compress_max_length: usize,
    pub compress_min_length: usize,
    pub corpus_input_cap: usize,
    pub corpus_max_length: usize,
    pub corpus_min_length: usize,
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        let p = SummaryParams::default();
        Self {
            chunk_max_length: p.chunk_max_length,
            chunk_min_length: p.chunk_min_length,
            compress_threshold: p.compress_threshold,
            compress_input_cap: p.compress_input_cap,
            compress_max_length: p.compress_max_length,
            compress_min_length: p.compress_min_length,
            corpus_input_cap: p.corpus_input_cap,
            corpus_max_length: p.corpus_max_length,
            corpus_min_length: p.corpus_min_length,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sentiment_sample_chars: usize,
    pub negative_softening_threshold: f32,
    pub entity_sample_chars: usize,
    pub top_entities: usize,
    pub concurrency: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let p = AnalysisParams::default();
        Self {
            sentiment_sample_chars: p.sentiment.sample_chars,
            negative_softening_threshold: p.sentiment.negative_softening_threshold,
            entity_sample_chars: p.entity_sample_chars,
            top_entities: p.top_entities,
            concurrency: p.concurrency,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Base URL override (OpenAI-compatible gateway or Ollama host).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_llm_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            url: None,
            temperature: 0.0,
            max_retries: default_llm_max_retries(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

fn default_llm_provider() -> String {
    "disabled".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_llm_max_retries() -> u32 {
    3
}
fn default_llm_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoaderConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            follow_symlinks: false,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    ["**/*.pdf", "**/*.docx", "**/*.txt", "**/*.html", "**/*.htm"]
        .iter()
        .map(|g| g.to_string())
        .collect()
}

impl Config {
    pub fn index_params(&self) -> IndexParams {
        IndexParams {
            chunk: ChunkParams {
                max_chars: self.chunking.retrieval_max_chars,
                overlap: self.chunking.retrieval_overlap,
            },
            snippet_chars: self.retrieval.snippet_chars,
        }
    }

    pub fn answer_params(&self) -> AnswerParams {
        AnswerParams {
            top_k: self.retrieval.top_k,
            context_char_budget: self.retrieval.context_char_budget,
        }
    }

    pub fn summary_params(&self) -> SummaryParams {
        let s = &self.summarization;
        SummaryParams {
            chunk: ChunkParams {
                max_chars: self.chunking.summary_max_chars,
                overlap: self.chunking.summary_overlap,
            },
            chunk_max_length: s.chunk_max_length,
            chunk_min_length: s.chunk_min_length,
            compress_threshold: s.compress_threshold,
            compress_input_cap: s.compress_input_cap,
            compress_max_length: s.compress_max_length,
            compress_min_length: s.compress_min_length,
            corpus_input_cap: s.corpus_input_cap,
            corpus_max_length: s.corpus_max_length,
            corpus_min_length: s.corpus_min_length,
        }
    }

    pub fn analysis_params(&self) -> AnalysisParams {
        let a = &self.analysis;
        AnalysisParams {
            summary: self.summary_params(),
            sentiment: SentimentPolicy {
                sample_chars: a.sentiment_sample_chars,
                negative_softening_threshold: a.negative_softening_threshold,
            },
            entity_sample_chars: a.entity_sample_chars,
            top_entities: a.top_entities,
            concurrency: a.concurrency,
        }
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        // Validate chunking
        let c = &self.chunking;
        check_chunking("retrieval", c.retrieval_max_chars, c.retrieval_overlap)?;
        check_chunking("summary", c.summary_max_chars, c.summary_overlap)?;

        // Validate retrieval
        if self.retrieval.top_k < 1 {
            bail!("retrieval.top_k must be >= 1");
        }
        if self.retrieval.context_char_budget == 0 {
            bail!("retrieval.context_char_budget must be > 0");
        }

        // Validate summarization
        let s = &self.summarization;
        for (name, min, max) in [
            ("chunk", s.chunk_min_length, s.chunk_max_length),
            ("compress", s.compress_min_length, s.compress_max_length),
            ("corpus", s.corpus_min_length, s.corpus_max_length),
        ] {
            if max == 0 || min > max {
                bail!(
                    "summarization.{name}_min_length ({min}) must be <= {name}_max_length ({max}) and the maximum > 0"
                );
            }
        }
        if s.compress_input_cap == 0 || s.corpus_input_cap == 0 {
            bail!("summarization input caps must be > 0");
        }

        // Validate analysis
        if !(0.0..=1.0).contains(&self.analysis.negative_softening_threshold) {
            bail!("analysis.negative_softening_threshold must be in [0.0, 1.0]");
        }
        if self.analysis.concurrency == 0 {
            bail!("analysis.concurrency must be >= 1");
        }

        // Validate embedding
        let e = &self.embedding;
        match e.provider.as_str() {
            "disabled" | "local" | "hash" => {}
            "openai" | "ollama" => {
                if e.dims.is_none() || e.dims == Some(0) {
                    bail!("embedding.dims must be > 0 when provider is '{}'", e.provider);
                }
                if e.model.is_none() {
                    bail!(
                        "embedding.model must be specified when provider is '{}'",
                        e.provider
                    );
                }
            }
            other => bail!(
                "Unknown embedding provider: '{}'. Must be local, openai, ollama, hash, or disabled.",
                other
            ),
        }
        if e.dims == Some(0) {
            bail!("embedding.dims must be > 0");
        }
        if e.batch_size == 0 {
            bail!("embedding.batch_size must be > 0");
        }

        // Validate llm
        match self.llm.provider.as_str() {
            "disabled" | "openai" | "ollama" => {}
            other => bail!(
                "Unknown llm provider: '{}'. Must be openai, ollama, or disabled.",
                other
            ),
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!("llm.temperature must be in [0.0, 2.0]");
        }

        Ok(())
    }
}

fn check_chunking(name: &str, max_chars: usize, overlap: usize) -> Result<()> {
    if max_chars == 0 {
        bail!("chunking.{name}_max_chars must be > 0");
    }
    if overlap >= max_chars {
        bail!("chunking.{name}_overlap ({overlap}) must be < {name}_max_chars ({max_chars})");
    }
    Ok(())
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

/// Load `path` when given, otherwise use the built-in defaults.
pub fn load_or_default(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None => {
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}
