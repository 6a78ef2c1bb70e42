//! Query pipeline: embed → weighted retrieval → rerank → consistency analysis

use crate::analysis::{ConsistencyAnalyzer, ConsistencyVerdict};
use crate::corpus::SourceWeights;
use crate::error::{ConcordError, Result};
use crate::index::SimilarityIndex;
use crate::retrieval::{Reranker, ScoredPassage};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Per-query pipeline knobs
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Shortlist size taken from the index
    pub retrieve_top_k: usize,
    /// Passages kept after reranking and handed to the analyzer
    pub rerank_top_k: usize,
    pub source_weights: SourceWeights,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            retrieve_top_k: 5,
            rerank_top_k: 3,
            source_weights: SourceWeights::default(),
        }
    }
}

/// Everything produced for one query
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub query: String,
    pub retrieved: Vec<ScoredPassage>,
    pub reranked: Vec<ScoredPassage>,
    pub verdict: ConsistencyVerdict,
}

/// Composes index, reranker and analyzer into the query pipeline
pub struct RetrievalPipeline {
    index: Arc<SimilarityIndex>,
    reranker: Reranker,
    analyzer: ConsistencyAnalyzer,
    settings: PipelineSettings,
}

impl RetrievalPipeline {
    pub fn new(
        index: Arc<SimilarityIndex>,
        reranker: Reranker,
        analyzer: ConsistencyAnalyzer,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            index,
            reranker,
            analyzer,
            settings,
        }
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run one query through every stage
    ///
    /// Retrieval and rerank failures propagate; the analyzer always yields
    /// a verdict.
    pub fn answer(&self, query: &str) -> Result<QueryOutcome> {
        if query.trim().is_empty() {
            return Err(ConcordError::InvalidArgument(
                "Query text cannot be empty".to_string(),
            ));
        }

        let retrieved = self.index.retrieve(
            query,
            Some(&self.settings.source_weights),
            self.settings.retrieve_top_k,
        )?;

        let reranked = self
            .reranker
            .rerank(query, &retrieved, self.settings.rerank_top_k)?;

        let verdict = self.analyzer.analyze(query, &reranked);

        info!(
            "Answered query: {} retrieved, {} reranked, verdict {}",
            retrieved.len(),
            reranked.len(),
            verdict.status
        );

        Ok(QueryOutcome {
            query: query.to_string(),
            retrieved,
            reranked,
            verdict,
        })
    }

    /// Answer each query independently; one failure does not stop the rest
    pub fn answer_all<S: AsRef<str>>(&self, queries: &[S]) -> Vec<Result<QueryOutcome>> {
        queries
            .iter()
            .map(|query| {
                let result = self.answer(query.as_ref());
                if let Err(e) = &result {
                    warn!("Query '{}' failed: {}", query.as_ref(), e);
                }
                result
            })
            .collect()
    }
}
