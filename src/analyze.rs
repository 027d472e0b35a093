//! `analyze` command: the full per-article report and its corpus roll-up.
//!
//! Each article gets a summary, a sentiment label with score, its named
//! entities and its character count. The corpus section adds the global
//! summary, the sentiment distribution and the most frequent entities.

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use article_analyzer_core::analysis::analyze_corpus;
use article_analyzer_core::models::CorpusReport;

use crate::config::Config;
use crate::loader::SkippedFile;
use crate::session::{build_models, load_corpus, print_skipped};

#[derive(Serialize)]
struct AnalyzeOutput<'a> {
    #[serde(flatten)]
    report: &'a CorpusReport,
    skipped: &'a [SkippedFile],
}

pub async fn run_analyze(config: &Config, paths: &[PathBuf], json: bool) -> Result<()> {
    let outcome = load_corpus(config, paths)?;
    let models = build_models(config)?;
    let report = analyze_corpus(&models, &outcome.documents, &config.analysis_params()).await;

    if json {
        let output = AnalyzeOutput {
            report: &report,
            skipped: &outcome.skipped,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_report(&report);
    print_skipped(&outcome.skipped);
    Ok(())
}

fn print_report(report: &CorpusReport) {
    println!("analyze");
    for (i, article) in report.articles.iter().enumerate() {
        println!("{}. {} [{}]", i + 1, article.name, article.id);
        println!("    chars: {}", article.chars);
        println!(
            "    sentiment: {} ({:.2})",
            article.sentiment.label, article.sentiment.score
        );
        if article.entities.is_empty() {
            println!("    entities: (none)");
        } else {
            let entities: Vec<String> = article
                .entities
                .iter()
                .map(|e| format!("{} ({})", e.text, e.label))
                .collect();
            println!("    entities: {}", entities.join(", "));
        }
        println!("    summary: {}", article.summary);
    }

    println!();
    println!("  global summary: {}", report.global_summary);
    let distribution: Vec<String> = report
        .sentiment_counts
        .iter()
        .map(|(label, count)| format!("{}={}", label, count))
        .collect();
    println!("  sentiment: {}", distribution.join(" "));
    if !report.top_entities.is_empty() {
        println!("  top entities:");
        for e in &report.top_entities {
            println!("    {:>4}  {} ({})", e.count, e.text, e.label);
        }
    }
}
