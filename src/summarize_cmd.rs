//! `summarize` command: one summary per document plus a corpus summary.

use anyhow::Result;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::PathBuf;

use article_analyzer_core::summarize::{summarize_corpus, summarize_document};

use crate::config::Config;
use crate::loader::SkippedFile;
use crate::session::{build_models, load_corpus, print_skipped};

#[derive(Serialize)]
struct DocumentSummary {
    id: String,
    name: String,
    summary: String,
}

#[derive(Serialize)]
struct SummaryReport {
    documents: Vec<DocumentSummary>,
    global_summary: String,
    skipped: Vec<SkippedFile>,
}

pub async fn run_summarize(config: &Config, paths: &[PathBuf], json: bool) -> Result<()> {
    let outcome = load_corpus(config, paths)?;
    let models = build_models(config)?;
    let params = config.summary_params();
    let summarizer = models.summarizer.as_ref();

    let documents: Vec<DocumentSummary> = stream::iter(&outcome.documents)
        .map(|doc| async move {
            DocumentSummary {
                id: doc.id.clone(),
                name: doc.name.clone(),
                summary: summarize_document(summarizer, &doc.text, &params).await,
            }
        })
        .buffered(config.analysis.concurrency.max(1))
        .collect()
        .await;

    let summaries: Vec<String> = documents.iter().map(|d| d.summary.clone()).collect();
    let global_summary = summarize_corpus(summarizer, &summaries, &params).await;

    let report = SummaryReport {
        documents,
        global_summary,
        skipped: outcome.skipped,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("summarize");
    for d in &report.documents {
        println!("  {} [{}]", d.name, d.id);
        println!("    {}", d.summary);
    }
    println!();
    println!("  global summary: {}", report.global_summary);
    print_skipped(&report.skipped);
    Ok(())
}
