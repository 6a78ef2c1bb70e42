//! Scored results and second-stage reranking
//!
//! The similarity index produces a coarse, source-weighted shortlist; the
//! reranker rescores that shortlist pairwise against the query.

mod reranker;
mod scored;

pub use reranker::{CrossEncoderScorer, RelevanceScorer, RerankError, Reranker, TermOverlapScorer};
pub use scored::{ScoredPassage, Stage};

use std::sync::Arc;

/// Build the scorer named in configuration
///
/// `term-overlap` needs no model download; other names load a cross-encoder.
pub fn scorer_for(model_name: &str) -> Result<Arc<dyn RelevanceScorer>, RerankError> {
    match model_name {
        "term-overlap" => Ok(Arc::new(TermOverlapScorer)),
        name => Ok(Arc::new(CrossEncoderScorer::new(name)?)),
    }
}
