//! Per-run setup shared by every command.
//!
//! A session loads the documents named on the command line and acquires
//! each model collaborator once. The resulting [`ModelSet`] is passed
//! explicitly into the core operations; nothing is global.

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::Arc;

use article_analyzer_core::provider::ModelSet;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::llm::{DisabledLlm, LlmClient};
use crate::loader::{load_paths, LoadOutcome, SkippedFile};

/// Acquire the embedder and the text collaborators described by `config`.
///
/// With `llm.provider = "disabled"` every text task fails at call time,
/// which the pipeline turns into markers, `unavailable` sentiment, empty
/// entity lists and the no-answer sentinel.
pub fn build_models(config: &Config) -> Result<ModelSet> {
    let embedder = create_embedder(&config.embedding)?;

    let models = if config.llm.provider == "disabled" {
        let llm = Arc::new(DisabledLlm);
        ModelSet {
            embedder,
            summarizer: llm.clone(),
            qa: llm.clone(),
            sentiment: llm.clone(),
            ner: llm,
        }
    } else {
        let llm = Arc::new(LlmClient::new(&config.llm)?);
        ModelSet {
            embedder,
            summarizer: llm.clone(),
            qa: llm.clone(),
            sentiment: llm.clone(),
            ner: llm,
        }
    };

    tracing::debug!(
        embedder = models.embedder.model_name(),
        dims = models.embedder.dims(),
        llm = %config.llm.provider,
        "models ready"
    );
    Ok(models)
}

/// Load documents from `paths`, failing when none could be loaded.
pub fn load_corpus(config: &Config, paths: &[PathBuf]) -> Result<LoadOutcome> {
    let outcome = load_paths(paths, &config.loader)?;
    if outcome.documents.is_empty() {
        bail!(
            "no documents loaded from {} path(s) ({} skipped)",
            paths.len(),
            outcome.skipped.len()
        );
    }
    Ok(outcome)
}

/// Print skipped files in the indented report style.
pub fn print_skipped(skipped: &[SkippedFile]) {
    if skipped.is_empty() {
        return;
    }
    println!("  skipped: {}", skipped.len());
    for s in skipped {
        println!("    {} ({})", s.path.display(), s.reason);
    }
}
