//! Second-stage reranking of a retrieved shortlist
//!
//! Rerank scores replace the upstream weighted similarity entirely. Scores
//! are only comparable within a single call.

use super::{ScoredPassage, Stage};
use crate::error::ConcordError;
use fastembed::{RerankInitOptions, RerankerModel, TextRerank};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RerankError {
    #[error("Reranker initialization failed: {0}")]
    InitializationError(String),

    #[error("Reranking failed: {0}")]
    RerankingError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<RerankError> for ConcordError {
    fn from(err: RerankError) -> Self {
        match err {
            RerankError::InvalidInput(msg) => ConcordError::InvalidArgument(msg),
            other => ConcordError::service_unavailable("reranker", other.to_string()),
        }
    }
}

/// Pairwise (query, passage) relevance scorer
pub trait RelevanceScorer: Send + Sync {
    /// One score per passage, in input order
    fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>, RerankError>;

    fn model_name(&self) -> &str;
}

/// Cross-encoder scorer backed by FastEmbed
pub struct CrossEncoderScorer {
    model: Arc<TextRerank>,
    model_name: String,
}

impl CrossEncoderScorer {
    /// Create a new cross-encoder with the specified model
    ///
    /// # Arguments
    /// * `model_name` - "bge-reranker-base" or "jina-reranker-v1-turbo-en"
    pub fn new(model_name: &str) -> Result<Self, RerankError> {
        let reranker_model = match model_name {
            "bge-reranker-base" => RerankerModel::BGERerankerBase,
            "jina-reranker-v1-turbo-en" => RerankerModel::JINARerankerV1TurboEn,
            _ => {
                return Err(RerankError::InitializationError(format!(
                    "Unsupported reranker model: {}",
                    model_name
                )))
            }
        };

        tracing::info!("Initializing reranker model: {}", model_name);

        let init_options = RerankInitOptions::new(reranker_model).with_show_download_progress(true);

        let model = TextRerank::try_new(init_options)
            .map_err(|e| RerankError::InitializationError(e.to_string()))?;

        Ok(Self {
            model: Arc::new(model),
            model_name: model_name.to_string(),
        })
    }

    /// Create scorer with default model
    pub fn with_default_model() -> Result<Self, RerankError> {
        Self::new("bge-reranker-base")
    }
}

impl RelevanceScorer for CrossEncoderScorer {
    fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>, RerankError> {
        let results = self
            .model
            .rerank(query, passages.to_vec(), false, None)
            .map_err(|e| RerankError::RerankingError(e.to_string()))?;

        // FastEmbed returns results sorted by score; put them back in input order
        let mut scores: Vec<Option<f32>> = vec![None; passages.len()];
        for result in results {
            match scores.get_mut(result.index) {
                Some(slot) => *slot = Some(result.score),
                None => {
                    return Err(RerankError::RerankingError(format!(
                        "Result index {} out of range",
                        result.index
                    )))
                }
            }
        }

        scores
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                s.ok_or_else(|| RerankError::RerankingError(format!("No score for passage {}", i)))
            })
            .collect()
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Offline scorer: fraction of distinct query terms present in the passage
pub struct TermOverlapScorer;

impl TermOverlapScorer {
    fn terms(text: &str) -> HashSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect()
    }
}

impl RelevanceScorer for TermOverlapScorer {
    fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>, RerankError> {
        let query_terms = Self::terms(query);
        if query_terms.is_empty() {
            return Ok(vec![0.0; passages.len()]);
        }

        Ok(passages
            .iter()
            .map(|passage| {
                let passage_terms = Self::terms(passage);
                let hits = query_terms
                    .iter()
                    .filter(|t| passage_terms.contains(*t))
                    .count();
                hits as f32 / query_terms.len() as f32
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "term-overlap"
    }
}

/// Refines a coarse candidate list with a relevance scorer
#[derive(Clone)]
pub struct Reranker {
    scorer: Arc<dyn RelevanceScorer>,
}

impl Reranker {
    pub fn new(scorer: Arc<dyn RelevanceScorer>) -> Self {
        Self { scorer }
    }

    /// Rerank `candidates` against `query` and keep the best `top_k`
    ///
    /// Output holds only input passages, tagged `Stage::Rerank`, sorted by
    /// rerank score descending; equal scores keep candidate order.
    pub fn rerank(
        &self,
        query: &str,
        candidates: &[ScoredPassage],
        top_k: usize,
    ) -> Result<Vec<ScoredPassage>, RerankError> {
        if top_k == 0 {
            return Err(RerankError::InvalidInput(
                "top_k must be at least 1".to_string(),
            ));
        }

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        if query.trim().is_empty() {
            return Err(RerankError::InvalidInput(
                "Query cannot be empty".to_string(),
            ));
        }

        let texts: Vec<&str> = candidates.iter().map(|c| c.text()).collect();
        let scores = self.scorer.score(query, &texts)?;

        if scores.len() != candidates.len() {
            return Err(RerankError::RerankingError(format!(
                "Scorer returned {} scores for {} candidates",
                scores.len(),
                candidates.len()
            )));
        }

        let mut reranked: Vec<ScoredPassage> = candidates
            .iter()
            .zip(scores)
            .map(|(candidate, score)| {
                ScoredPassage::new(Arc::clone(&candidate.passage), score, Stage::Rerank)
            })
            .collect();

        reranked.sort_by(ScoredPassage::cmp_score_desc);
        reranked.truncate(top_k);

        tracing::debug!(
            "Reranked {} candidates with {}, kept {}",
            candidates.len(),
            self.scorer.model_name(),
            reranked.len()
        );

        Ok(reranked)
    }

    pub fn model_name(&self) -> &str {
        self.scorer.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Passage, SourceClass};

    struct FixedScorer(Vec<f32>);

    impl RelevanceScorer for FixedScorer {
        fn score(&self, _query: &str, passages: &[&str]) -> Result<Vec<f32>, RerankError> {
            Ok(self.0.iter().copied().take(passages.len()).collect())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingScorer;

    impl RelevanceScorer for FailingScorer {
        fn score(&self, _query: &str, _passages: &[&str]) -> Result<Vec<f32>, RerankError> {
            Err(RerankError::RerankingError("model crashed".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn candidates(n: usize) -> Vec<ScoredPassage> {
        (0..n)
            .map(|i| {
                let passage =
                    Passage::new(format!("p{}", i), SourceClass::Docs, "a.md", format!("text {}", i))
                        .unwrap();
                ScoredPassage::new(Arc::new(passage), 1.0 - i as f32 * 0.1, Stage::Retrieval)
            })
            .collect()
    }

    #[test]
    fn test_rerank_reorders_by_scorer() {
        let reranker = Reranker::new(Arc::new(FixedScorer(vec![-3.0, 5.5, 0.2, 7.1])));
        let results = reranker.rerank("query", &candidates(4), 3).unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["p3", "p1", "p2"]);
        assert_eq!(results[0].score, 7.1);
        assert!(results.iter().all(|r| r.stage == Stage::Rerank));
    }

    #[test]
    fn test_rerank_output_length() {
        let reranker = Reranker::new(Arc::new(FixedScorer(vec![1.0, 2.0])));
        assert_eq!(reranker.rerank("q", &candidates(2), 5).unwrap().len(), 2);
        assert!(reranker.rerank("q", &[], 3).unwrap().is_empty());
    }

    #[test]
    fn test_rerank_ties_keep_candidate_order() {
        let reranker = Reranker::new(Arc::new(FixedScorer(vec![1.0, 1.0, 1.0])));
        let results = reranker.rerank("q", &candidates(3), 3).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["p0", "p1", "p2"]);
    }

    #[test]
    fn test_rerank_signed_zero_scores_tie() {
        let reranker = Reranker::new(Arc::new(FixedScorer(vec![-0.0, 0.0, -0.0])));
        let results = reranker.rerank("q", &candidates(3), 3).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["p0", "p1", "p2"]);
    }

    #[test]
    fn test_rerank_failure_propagates() {
        let reranker = Reranker::new(Arc::new(FailingScorer));
        let err = reranker.rerank("q", &candidates(2), 1).unwrap_err();
        assert!(matches!(err, RerankError::RerankingError(_)));
        assert!(matches!(
            ConcordError::from(err),
            ConcordError::ServiceUnavailable { .. }
        ));
    }

    #[test]
    fn test_short_score_list_is_an_error() {
        let reranker = Reranker::new(Arc::new(FixedScorer(vec![1.0])));
        assert!(reranker.rerank("q", &candidates(3), 3).is_err());
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let reranker = Reranker::new(Arc::new(TermOverlapScorer));
        assert!(matches!(
            reranker.rerank("q", &candidates(1), 0),
            Err(RerankError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_term_overlap_scorer() {
        let scores = TermOverlapScorer
            .score(
                "history retention Basic plan",
                &["Basic plan retains 30 days of history", "Pro plan has SSO"],
            )
            .unwrap();
        assert_eq!(scores, vec![0.75, 0.25]);
    }

    #[test]
    #[ignore] // Requires model download
    fn test_cross_encoder_basic() {
        let scorer = CrossEncoderScorer::with_default_model().unwrap();
        let scores = scorer
            .score(
                "What is the capital of France?",
                &["Paris is the capital of France.", "The weather is nice today."],
            )
            .unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores[0] > scores[1]);
    }
}
