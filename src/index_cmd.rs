//! `index` command: load documents, build the passage index and report it.
//!
//! Useful as a dry run before `ask`: it shows how many passages each run
//! will search and which documents could not be embedded.

use anyhow::Result;
use std::path::PathBuf;

use article_analyzer_core::index::build_index;

use crate::config::Config;
use crate::session::{build_models, load_corpus, print_skipped};

pub async fn run_index(config: &Config, paths: &[PathBuf], json: bool) -> Result<()> {
    let outcome = load_corpus(config, paths)?;
    let models = build_models(config)?;
    let index = build_index(
        models.embedder.as_ref(),
        &outcome.documents,
        &config.index_params(),
    )
    .await;

    if json {
        let report = serde_json::json!({
            "documents": outcome.documents.len(),
            "indexed_documents": index.document_count(),
            "passages": index.len(),
            "dims": index.dims(),
            "embedder": models.embedder.model_name(),
            "failures": index.failures(),
            "skipped": outcome.skipped,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("index");
    println!("  documents: {}", outcome.documents.len());
    println!("  indexed documents: {}", index.document_count());
    println!("  passages: {}", index.len());
    println!("  dims: {}", index.dims());
    println!("  embedder: {}", models.embedder.model_name());
    if !index.failures().is_empty() {
        println!("  failures: {}", index.failures().len());
        for f in index.failures() {
            println!("    {} ({})", f.name, f.reason);
        }
    }
    print_skipped(&outcome.skipped);
    println!("ok");
    Ok(())
}
