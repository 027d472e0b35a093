//! Document loader.
//!
//! Turns the paths given on the command line into [`Document`]s. Files are
//! read directly; directories are walked recursively (sorted by file name,
//! so the document order is deterministic) and filtered by the configured
//! include globs. Text is extracted per format by [`crate::extract`].
//!
//! Nothing here is fatal for a single file: unreadable files, extraction
//! errors, unsupported extensions and blank documents end up in
//! [`LoadOutcome::skipped`] with a reason.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use article_analyzer_core::models::Document;
use article_analyzer_core::normalize::normalize_whitespace;

use crate::config::LoaderConfig;
use crate::extract::{extract_text, Format};

/// A file that did not produce a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Loaded documents in argument order, directory entries sorted.
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedFile>,
}

impl LoadOutcome {
    fn skip(&mut self, path: &Path, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(path = %path.display(), "skipped: {}", reason);
        self.skipped.push(SkippedFile {
            path: path.to_path_buf(),
            reason,
        });
    }
}

/// Load every document reachable from `paths`.
///
/// # Errors
///
/// Only an invalid include glob is an error; per-file problems are
/// reported in [`LoadOutcome::skipped`].
pub fn load_paths(paths: &[PathBuf], config: &LoaderConfig) -> Result<LoadOutcome> {
    let include_set = build_globset(&config.include_globs)?;
    let mut outcome = LoadOutcome::default();

    for root in paths {
        if root.is_dir() {
            load_directory(root, &include_set, config.follow_symlinks, &mut outcome);
        } else if root.exists() {
            let name = root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| root.display().to_string());
            load_file(root, &name, &mut outcome);
        } else {
            outcome.skip(root, "path does not exist");
        }
    }

    tracing::info!(
        documents = outcome.documents.len(),
        skipped = outcome.skipped.len(),
        "loaded documents"
    );
    Ok(outcome)
}

fn load_directory(root: &Path, include_set: &GlobSet, follow_symlinks: bool, outcome: &mut LoadOutcome) {
    let walker = WalkDir::new(root)
        .follow_links(follow_symlinks)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                outcome.skip(&path, e.to_string());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if !include_set.is_match(&rel_str) {
            continue;
        }

        load_file(path, &rel_str, outcome);
    }
}

fn load_file(path: &Path, name: &str, outcome: &mut LoadOutcome) {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) => return outcome.skip(path, format!("read failed: {}", e)),
    };

    let Some(format) = Format::from_path(path) else {
        return outcome.skip(path, "unsupported file type");
    };

    let text = match extract_text(&raw, format) {
        Ok(text) => text,
        Err(e) => return outcome.skip(path, e.to_string()),
    };

    if normalize_whitespace(&text).is_empty() {
        return outcome.skip(path, "no extractable text");
    }

    tracing::debug!(path = %path.display(), chars = text.chars().count(), "extracted");
    outcome
        .documents
        .push(Document::from_upload(name, &raw, text));
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
