//! Per-query reporting of retrieval results and verdicts

use crate::analysis::ConsistencyVerdict;
use crate::error::{ConcordError, Result};
use crate::pipeline::QueryOutcome;
use crate::retrieval::ScoredPassage;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default preview length in characters
pub const DEFAULT_PREVIEW_CHARS: usize = 150;

/// Consumer of finished query outcomes
pub trait QueryReporter {
    fn report(&self, outcome: &QueryOutcome) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct RetrievedEntry<'a> {
    source: &'a str,
    retrieval_score: f32,
    preview: &'a str,
}

#[derive(Debug, Serialize)]
struct RerankedEntry<'a> {
    source: &'a str,
    rerank_score: f32,
    preview: &'a str,
}

#[derive(Debug, Serialize)]
struct LogEntry<'a> {
    timestamp: String,
    query: &'a str,
    retrieved: Vec<RetrievedEntry<'a>>,
    reranked: Vec<RerankedEntry<'a>>,
    contradiction: &'a ConsistencyVerdict,
}

/// Appends one JSON line per query to a log file
pub struct JsonlReporter {
    path: PathBuf,
    preview_chars: usize,
}

impl JsonlReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }

    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn preview<'a>(&self, item: &'a ScoredPassage) -> &'a str {
        item.passage.preview(self.preview_chars)
    }

    fn entry<'a>(&self, outcome: &'a QueryOutcome) -> LogEntry<'a> {
        LogEntry {
            timestamp: chrono::Local::now().to_rfc3339(),
            query: &outcome.query,
            retrieved: outcome
                .retrieved
                .iter()
                .map(|item| RetrievedEntry {
                    source: item.source_class().as_str(),
                    retrieval_score: item.score,
                    preview: self.preview(item),
                })
                .collect(),
            reranked: outcome
                .reranked
                .iter()
                .map(|item| RerankedEntry {
                    source: item.source_class().as_str(),
                    rerank_score: item.score,
                    preview: self.preview(item),
                })
                .collect(),
            contradiction: &outcome.verdict,
        }
    }
}

impl QueryReporter for JsonlReporter {
    fn report(&self, outcome: &QueryOutcome) -> Result<()> {
        let line = serde_json::to_string(&self.entry(outcome)).map_err(|e| ConcordError::Json {
            source: e,
            context: "Failed to serialize log entry".to_string(),
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConcordError::Io {
                source: e,
                context: format!("Failed to create log directory: {:?}", parent),
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ConcordError::Io {
                source: e,
                context: format!("Failed to open log file: {:?}", self.path),
            })?;

        writeln!(file, "{}", line).map_err(|e| ConcordError::Io {
            source: e,
            context: format!("Failed to append to log file: {:?}", self.path),
        })?;

        tracing::debug!("Logged query to {:?}", self.path);
        Ok(())
    }
}
