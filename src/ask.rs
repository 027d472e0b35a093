//! `ask` command: retrieval-augmented question answering over the corpus.
//!
//! Builds a fresh index over the given paths, retrieves the top-k passages
//! for the question and asks the QA model for a span of that context.

use anyhow::Result;
use std::path::PathBuf;

use article_analyzer_core::answer::answer_question;
use article_analyzer_core::index::build_index;

use crate::config::Config;
use crate::session::{build_models, load_corpus, print_skipped};

/// Run the ask command. `top_k` overrides `[retrieval].top_k`.
pub async fn run_ask(
    config: &Config,
    question: &str,
    paths: &[PathBuf],
    top_k: Option<usize>,
    json: bool,
) -> Result<()> {
    let outcome = load_corpus(config, paths)?;
    let models = build_models(config)?;
    let index = build_index(
        models.embedder.as_ref(),
        &outcome.documents,
        &config.index_params(),
    )
    .await;

    let mut params = config.answer_params();
    if let Some(k) = top_k {
        params.top_k = k;
    }

    let result = answer_question(&models, &index, question, &params).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("ask \"{}\"", question.trim());
    println!("  answer: {}", result.answer);
    if let Some(confidence) = result.confidence {
        println!("  confidence: {:.2}", confidence);
    }
    println!("  passages searched: {}", index.len());

    if !result.supporting_passages.is_empty() {
        println!();
        for (i, (passage, score)) in result
            .supporting_passages
            .iter()
            .zip(&result.similarities)
            .enumerate()
        {
            println!("{}. [{:.2}] {} #{}", i + 1, score, passage.name, passage.ordinal);
            println!("    excerpt: \"{}\"", passage.snippet.replace('\n', " ").trim());
            println!("    id: {}", passage.document_id);
        }
    }
    print_skipped(&outcome.skipped);
    Ok(())
}
