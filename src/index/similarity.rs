//! Cosine similarity and weighted ranking over an in-memory vector set

use crate::corpus::{Passage, SourceWeights};
use crate::retrieval::{ScoredPassage, Stage};
use std::sync::Arc;

/// Cosine similarity in [-1, 1]; zero-magnitude vectors score 0.0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    (dot / (mag_a * mag_b)).clamp(-1.0, 1.0)
}

/// Rank passages by `similarity * weight(source_class)`, descending
///
/// `passages` and `vectors` are parallel slices in ingestion order. The sort
/// is stable, so equal weighted scores keep ingestion order.
pub fn rank_weighted(
    query_vector: &[f32],
    passages: &[Arc<Passage>],
    vectors: &[Vec<f32>],
    weights: &SourceWeights,
    top_k: usize,
) -> Vec<ScoredPassage> {
    let mut scored: Vec<ScoredPassage> = passages
        .iter()
        .zip(vectors.iter())
        .map(|(passage, vector)| {
            let similarity = cosine_similarity(query_vector, vector);
            let weight = weights.weight(passage.source_class());
            ScoredPassage::new(Arc::clone(passage), similarity * weight, Stage::Retrieval)
        })
        .collect();

    scored.sort_by(ScoredPassage::cmp_score_desc);
    scored.truncate(top_k);
    scored
}
