//! CLI integration tests driving the compiled `article-analyzer` binary.
//!
//! Every run uses the offline `hash` embedder with the LLM disabled, so the
//! text tasks degrade (markers, `unavailable`, no-answer sentinel) while
//! loading, indexing and retrieval run for real.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn analyzer_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("article-analyzer");
    path
}

fn setup_test_env() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let files_dir = root.join("articles");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(
        files_dir.join("alpha.txt"),
        "Paris is the capital of France. The Louvre opened as a museum in 1793.",
    )
    .unwrap();
    fs::write(
        files_dir.join("beta.html"),
        "<html><body><h1>Harbor</h1><p>A storm closed the port of Lisbon.</p></body></html>",
    )
    .unwrap();
    fs::write(files_dir.join("gamma.txt"), "x".repeat(2000)).unwrap();

    let config_path = root.join("article-analyzer.toml");
    fs::write(
        &config_path,
        r#"[embedding]
provider = "hash"
dims = 128

[llm]
provider = "disabled"

[retrieval]
top_k = 2
"#,
    )
    .unwrap();

    (tmp, config_path, files_dir)
}

fn run(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(analyzer_binary())
        .arg("--config")
        .arg(config_path)
        .args(args)
        .output()
        .expect("failed to run article-analyzer");
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

fn run_json(config_path: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let (stdout, stderr, ok) = run(config_path, &full);
    assert!(ok, "command failed: {}", stderr);
    serde_json::from_str(&stdout).expect("stdout is not JSON")
}

#[test]
fn test_index_reports_counts() {
    let (_tmp, config, files) = setup_test_env();
    let (stdout, stderr, ok) = run(&config, &["index", files.to_str().unwrap()]);
    assert!(ok, "index failed: {}", stderr);
    assert!(stdout.contains("documents: 3"));
    // 2000 chars with the 900/120 window: 900, 900, 440
    assert!(stdout.contains("passages: 5"));
    assert!(stdout.contains("dims: 128"));
    assert!(stdout.contains("embedder: hash"));
    assert!(stdout.trim_end().ends_with("ok"));
}

#[test]
fn test_index_json() {
    let (_tmp, config, files) = setup_test_env();
    let json = run_json(&config, &["index", files.to_str().unwrap()]);
    assert_eq!(json["documents"], 3);
    assert_eq!(json["passages"], 5);
    assert_eq!(json["failures"].as_array().unwrap().len(), 0);
}

#[test]
fn test_ask_without_llm_returns_sentinel_with_passages() {
    let (_tmp, config, files) = setup_test_env();
    let json = run_json(
        &config,
        &["ask", "What is the capital of France?", files.to_str().unwrap()],
    );
    assert_eq!(json["answered"], false);
    assert_eq!(json["answer"], "(no exact answer found; try rephrasing)");
    let passages = json["supporting_passages"].as_array().unwrap();
    assert_eq!(passages.len(), 2);
    assert_eq!(passages[0]["name"], "alpha.txt");

    let scores = json["similarities"].as_array().unwrap();
    assert!(scores[0].as_f64().unwrap() >= scores[1].as_f64().unwrap());
}

#[test]
fn test_ask_top_k_flag_overrides_config() {
    let (_tmp, config, files) = setup_test_env();
    let json = run_json(
        &config,
        &["ask", "storm in Lisbon", files.to_str().unwrap(), "--top-k", "4"],
    );
    assert_eq!(json["supporting_passages"].as_array().unwrap().len(), 4);
}

#[test]
fn test_ask_text_output() {
    let (_tmp, config, files) = setup_test_env();
    let (stdout, _, ok) = run(&config, &["ask", "museum", files.to_str().unwrap()]);
    assert!(ok);
    assert!(stdout.contains("answer: (no exact answer found; try rephrasing)"));
    assert!(stdout.contains("1. ["));
    assert!(stdout.contains("excerpt:"));
}

#[test]
fn test_summarize_marks_unavailable_summaries() {
    let (_tmp, config, files) = setup_test_env();
    let json = run_json(&config, &["summarize", files.to_str().unwrap()]);
    let docs = json["documents"].as_array().unwrap();
    assert_eq!(docs.len(), 3);
    for d in docs {
        assert!(d["summary"]
            .as_str()
            .unwrap()
            .starts_with("[summary unavailable:"));
    }
    assert_eq!(json["global_summary"], "");
}

#[test]
fn test_analyze_json_report() {
    let (_tmp, config, files) = setup_test_env();
    let json = run_json(&config, &["analyze", files.to_str().unwrap()]);

    let articles = json["articles"].as_array().unwrap();
    assert_eq!(articles.len(), 3);
    assert_eq!(articles[0]["name"], "alpha.txt");
    assert_eq!(articles[2]["name"], "gamma.txt");
    assert_eq!(articles[2]["chars"], 2000);
    assert!(articles
        .iter()
        .all(|a| a["sentiment"]["label"] == "unavailable"));
    assert_eq!(json["sentiment_counts"]["unavailable"], 3);
    assert_eq!(json["top_entities"].as_array().unwrap().len(), 0);
    assert_eq!(json["skipped"].as_array().unwrap().len(), 0);
}

#[test]
fn test_analyze_text_output() {
    let (_tmp, config, files) = setup_test_env();
    let (stdout, _, ok) = run(&config, &["analyze", files.to_str().unwrap()]);
    assert!(ok);
    assert!(stdout.contains("1. alpha.txt"));
    assert!(stdout.contains("sentiment: unavailable"));
    assert!(stdout.contains("entities: (none)"));
}

#[test]
fn test_no_documents_fails() {
    let (tmp, config, _) = setup_test_env();
    let empty = tmp.path().join("empty");
    fs::create_dir_all(&empty).unwrap();
    fs::write(empty.join("blank.txt"), "   \n").unwrap();

    let (_, stderr, ok) = run(&config, &["index", empty.to_str().unwrap()]);
    assert!(!ok);
    assert!(stderr.contains("no documents loaded"));
}

#[test]
fn test_skipped_files_are_reported() {
    let (_tmp, config, files) = setup_test_env();
    let missing = files.join("missing.txt");
    let (stdout, _, ok) = run(
        &config,
        &["index", files.to_str().unwrap(), missing.to_str().unwrap()],
    );
    assert!(ok);
    assert!(stdout.contains("skipped: 1"));
    assert!(stdout.contains("path does not exist"));
}

#[test]
fn test_invalid_config_fails() {
    let (tmp, _, files) = setup_test_env();
    let bad = tmp.path().join("bad.toml");
    fs::write(&bad, "[chunking]\nretrieval_max_chars = 100\nretrieval_overlap = 100\n").unwrap();
    let (_, stderr, ok) = run(&bad, &["index", files.to_str().unwrap()]);
    assert!(!ok);
    assert!(stderr.contains("retrieval_overlap"));
}
