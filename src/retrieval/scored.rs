//! Scored passage views produced by retrieval and reranking

use crate::corpus::{Passage, SourceClass};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Which pipeline stage produced a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Weighted cosine similarity from the index
    Retrieval,
    /// Pairwise relevance from the reranker
    Rerank,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Retrieval => f.write_str("retrieval"),
            Stage::Rerank => f.write_str("rerank"),
        }
    }
}

/// A passage paired with a relevance score
///
/// Transient view: the passage is shared with the index that owns it, and
/// only the ordering of a result list carries meaning.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredPassage {
    /// Passage borrowed from the index
    pub passage: Arc<Passage>,

    /// Score from `stage` (higher is better)
    pub score: f32,

    /// Stage that produced the score
    pub stage: Stage,
}

impl ScoredPassage {
    pub fn new(passage: Arc<Passage>, score: f32, stage: Stage) -> Self {
        Self {
            passage,
            score,
            stage,
        }
    }

    /// Descending by score; a stable sort with this keeps equal scores in input order
    ///
    /// Adding `0.0` folds `-0.0` into `0.0` so the two tie under `total_cmp`.
    pub fn cmp_score_desc(a: &Self, b: &Self) -> Ordering {
        (b.score + 0.0).total_cmp(&(a.score + 0.0))
    }

    pub fn id(&self) -> &str {
        self.passage.id()
    }

    pub fn source_class(&self) -> SourceClass {
        self.passage.source_class()
    }

    pub fn text(&self) -> &str {
        self.passage.text()
    }
}
