//! In-memory similarity index with source-weighted retrieval
//!
//! The index embeds every passage once at build time. Source weights are
//! applied after similarity, so a different trust configuration can be used
//! per query without re-embedding anything.
//!
//! `build` holds the write lock for its whole duration: queries block until
//! the build finishes, and a failed build leaves the previous state intact.

mod similarity;

pub use similarity::{cosine_similarity, rank_weighted};

use crate::corpus::{Passage, SourceWeights};
use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::error::{ConcordError, Result};
use crate::retrieval::ScoredPassage;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Default number of passages sent to the embedding provider per call
pub const DEFAULT_BUILD_BATCH: usize = 32;

/// Embedded corpus snapshot
struct IndexState {
    passages: Vec<Arc<Passage>>,
    vectors: Vec<Vec<f32>>,
    dimension: usize,
}

/// Weighted nearest-neighbor index over a complete passage snapshot
pub struct SimilarityIndex {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    state: RwLock<Option<IndexState>>,
}

impl SimilarityIndex {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            batch_size: DEFAULT_BUILD_BATCH,
            state: RwLock::new(None),
        }
    }

    /// Passages per embedding call during build (minimum 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Embed `passages` and replace any prior index state
    ///
    /// All-or-nothing: any embedding failure aborts the build and the
    /// previous state (built or not) is kept. Returns the passage count.
    pub fn build(&self, passages: Vec<Passage>) -> Result<usize> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        let mut seen = HashSet::with_capacity(passages.len());
        for passage in &passages {
            if !seen.insert(passage.id()) {
                return Err(ConcordError::DuplicatePassage {
                    id: passage.id().to_string(),
                });
            }
        }

        info!(
            "Building index over {} passages with {}",
            passages.len(),
            self.provider.model_name()
        );

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(passages.len());
        for (batch_no, batch) in passages.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|p| p.text().to_string()).collect();
            let embedded = self.provider.embed_batch(&texts)?;

            if embedded.len() != texts.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: texts.len(),
                    actual: embedded.len(),
                }
                .into());
            }

            debug!("Embedded batch {} ({} passages)", batch_no, texts.len());
            vectors.extend(embedded);
        }

        let dimension = vectors
            .first()
            .map(Vec::len)
            .unwrap_or_else(|| self.provider.dimension());

        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            }
            .into());
        }

        let count = passages.len();
        *state = Some(IndexState {
            passages: passages.into_iter().map(Arc::new).collect(),
            vectors,
            dimension,
        });

        info!("Index build complete: {} passages, {}D", count, dimension);
        Ok(count)
    }

    /// Top `top_k` passages by weighted cosine similarity to `query`
    ///
    /// `source_weights` defaults to `SourceWeights::default()`
    /// (docs=1.2, blog=1.0, forum=0.9).
    pub fn retrieve(
        &self,
        query: &str,
        source_weights: Option<&SourceWeights>,
        top_k: usize,
    ) -> Result<Vec<ScoredPassage>> {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let state = guard.as_ref().ok_or(ConcordError::NotBuilt)?;

        if top_k == 0 {
            return Err(ConcordError::InvalidArgument(
                "top_k must be at least 1".to_string(),
            ));
        }
        if query.trim().is_empty() {
            return Err(ConcordError::InvalidArgument(
                "Query text cannot be empty".to_string(),
            ));
        }

        let query_vector = self.provider.embed(query)?;
        if query_vector.len() != state.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: state.dimension,
                actual: query_vector.len(),
            }
            .into());
        }

        let default_weights;
        let weights = match source_weights {
            Some(weights) => weights,
            None => {
                default_weights = SourceWeights::default();
                &default_weights
            }
        };

        let results = rank_weighted(
            &query_vector,
            &state.passages,
            &state.vectors,
            weights,
            top_k,
        );

        debug!(
            "Retrieved {} of {} passages for query (top_k={})",
            results.len(),
            state.passages.len(),
            top_k
        );

        Ok(results)
    }

    pub fn is_built(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of indexed passages (0 when not built)
    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(0, |s| s.passages.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a passage with `id` is part of the current snapshot
    pub fn contains(&self, id: &str) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|s| s.passages.iter().any(|p| p.id() == id))
    }

    /// Vector dimension of the current snapshot
    pub fn dimension(&self) -> Option<usize> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.dimension)
    }
}
