//! Integration tests: index → rerank → consistency analysis
//!
//! Uses a vocabulary embedder and scripted reasoning services so the full
//! pipeline runs without model downloads or a local inference server.

use concord::analysis::{
    ConsistencyAnalyzer, ReasoningError, ReasoningRequest, ReasoningService, VerdictStatus,
};
use concord::corpus::{AuthorityPolicy, Passage, SourceClass, SourceWeights};
use concord::embedding::{EmbeddingError, EmbeddingProvider};
use concord::index::SimilarityIndex;
use concord::pipeline::{PipelineSettings, RetrievalPipeline};
use concord::retrieval::{RelevanceScorer, RerankError, Reranker, Stage, TermOverlapScorer};
use concord::ConcordError;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const VOCABULARY: [&str; 10] = [
    "basic", "plan", "history", "days", "api", "rate", "limit", "requests", "minute", "sync",
];

/// Bag-of-words over a fixed vocabulary
struct VocabularyEmbedder;

impl EmbeddingProvider for VocabularyEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let tokens: Vec<&str> = lower.split(|c: char| !c.is_alphanumeric()).collect();
                VOCABULARY
                    .iter()
                    .map(|word| if tokens.contains(word) { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        VOCABULARY.len()
    }

    fn model_name(&self) -> &str {
        "vocabulary"
    }
}

/// Returns a fixed response and records every request
struct ScriptedService {
    response: Result<String, Duration>,
    requests: Mutex<Vec<ReasoningRequest>>,
}

impl ScriptedService {
    fn replying(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn timing_out() -> Self {
        Self {
            response: Err(Duration::from_secs(60)),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl ReasoningService for ScriptedService {
    fn complete(&self, request: &ReasoningRequest) -> Result<String, ReasoningError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(timeout) => Err(ReasoningError::Timeout(*timeout)),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Fails for any query mentioning "outage"
struct FlakyScorer;

impl RelevanceScorer for FlakyScorer {
    fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>, RerankError> {
        if query.contains("outage") {
            return Err(RerankError::RerankingError("scorer offline".to_string()));
        }
        TermOverlapScorer.score(query, passages)
    }

    fn model_name(&self) -> &str {
        "flaky"
    }
}

const CONTRADICTION_REPLY: &str = "Here is my analysis:\n\
    {\"status\": \"contradiction\", \"explanation\": \"Docs say 30 days, the forum says 7.\", \
    \"authoritative_answer\": \"30 days\"}\nLet me know if you need more.";

fn corpus() -> Vec<Passage> {
    vec![
        Passage::new("d1", SourceClass::Docs, "docs/plans.md", "Basic plan keeps history for 30 days.")
            .unwrap(),
        Passage::new("f1", SourceClass::Forum, "forums/t1.txt", "Basic plan keeps history for 7 days I think.")
            .unwrap(),
        Passage::new("b1", SourceClass::Blog, "blogs/limits.md", "The API rate limit is 100 requests per minute.")
            .unwrap(),
        Passage::new("d2", SourceClass::Docs, "docs/api.md", "API limit for the basic plan is 100 requests per minute.")
            .unwrap(),
    ]
}

fn built_index() -> Arc<SimilarityIndex> {
    let index = Arc::new(SimilarityIndex::new(Arc::new(VocabularyEmbedder)));
    assert_eq!(index.build(corpus()).unwrap(), 4);
    index
}

fn pipeline_with(
    index: Arc<SimilarityIndex>,
    scorer: Arc<dyn RelevanceScorer>,
    service: Arc<ScriptedService>,
    settings: PipelineSettings,
) -> RetrievalPipeline {
    let analyzer = ConsistencyAnalyzer::new(service, AuthorityPolicy::default());
    RetrievalPipeline::new(index, Reranker::new(scorer), analyzer, settings)
}

#[test]
fn test_docs_outrank_forum_and_win_contradiction() {
    let service = Arc::new(ScriptedService::replying(CONTRADICTION_REPLY));
    let pipeline = pipeline_with(
        built_index(),
        Arc::new(TermOverlapScorer),
        Arc::clone(&service),
        PipelineSettings::default(),
    );

    let outcome = pipeline
        .answer("How long does the basic plan keep history?")
        .unwrap();

    // Equal raw similarity; the docs weight (1.2) beats the forum weight (0.9)
    assert_eq!(outcome.retrieved[0].id(), "d1");
    assert_eq!(outcome.retrieved[1].id(), "f1");
    let ratio = outcome.retrieved[0].score / outcome.retrieved[1].score;
    assert!((ratio - 1.2 / 0.9).abs() < 1e-4);
    assert!(outcome.retrieved.iter().all(|r| r.stage == Stage::Retrieval));

    assert!(outcome.reranked.len() <= 3);
    assert!(outcome.reranked.iter().all(|r| r.stage == Stage::Rerank));
    assert_eq!(outcome.reranked[0].id(), "d1");

    assert_eq!(outcome.verdict.status, VerdictStatus::Contradiction);
    assert_eq!(outcome.verdict.authoritative_answer, "30 days");

    // The analyzer saw the reranked evidence in order, with the authority order
    let requests = service.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let prompt = &requests[0].prompt;
    let docs_at = prompt.find("[SOURCE: docs] Basic plan keeps history for 30 days.").unwrap();
    let forum_at = prompt.find("[SOURCE: forum] Basic plan keeps history for 7 days").unwrap();
    assert!(docs_at < forum_at);
    assert!(prompt.contains("docs (highest)"));
}

#[test]
fn test_reranked_is_subset_of_retrieved() {
    let service = Arc::new(ScriptedService::replying(CONTRADICTION_REPLY));
    let settings = PipelineSettings {
        retrieve_top_k: 3,
        rerank_top_k: 2,
        source_weights: SourceWeights::default(),
    };
    let pipeline = pipeline_with(built_index(), Arc::new(TermOverlapScorer), service, settings);

    let outcome = pipeline.answer("What is the API rate limit?").unwrap();

    assert_eq!(outcome.retrieved.len(), 3);
    assert_eq!(outcome.reranked.len(), 2);
    for item in &outcome.reranked {
        assert!(outcome.retrieved.iter().any(|r| r.id() == item.id()));
    }
    assert!(outcome.reranked.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_rerank_top_k_larger_than_shortlist() {
    let service = Arc::new(ScriptedService::replying(CONTRADICTION_REPLY));
    let settings = PipelineSettings {
        retrieve_top_k: 2,
        rerank_top_k: 10,
        source_weights: SourceWeights::default(),
    };
    let pipeline = pipeline_with(built_index(), Arc::new(TermOverlapScorer), service, settings);

    let outcome = pipeline.answer("basic plan history").unwrap();
    assert_eq!(outcome.retrieved.len(), 2);
    assert_eq!(outcome.reranked.len(), 2);
}

#[test]
fn test_answer_all_continues_after_rerank_failure() {
    let service = Arc::new(ScriptedService::replying(CONTRADICTION_REPLY));
    let pipeline = pipeline_with(
        built_index(),
        Arc::new(FlakyScorer),
        Arc::clone(&service),
        PipelineSettings::default(),
    );

    let results = pipeline.answer_all(&[
        "How long does the basic plan keep history?",
        "Was there an API outage?",
        "What is the API rate limit?",
    ]);

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(ConcordError::ServiceUnavailable { .. })
    ));
    assert!(results[2].is_ok());

    // The failed query never reached the analyzer
    assert_eq!(service.request_count(), 2);
}

#[test]
fn test_reasoning_timeout_degrades_to_insufficient_data() {
    let service = Arc::new(ScriptedService::timing_out());
    let pipeline = pipeline_with(
        built_index(),
        Arc::new(TermOverlapScorer),
        service,
        PipelineSettings::default(),
    );

    let outcome = pipeline.answer("basic plan history").unwrap();
    assert!(!outcome.reranked.is_empty());
    assert_eq!(outcome.verdict.status, VerdictStatus::InsufficientData);
    assert!(outcome.verdict.explanation.starts_with("Model error:"));
    assert_eq!(outcome.verdict.authoritative_answer, "");
}

#[test]
fn test_unparseable_reply_degrades_to_insufficient_data() {
    let service = Arc::new(ScriptedService::replying("The sources mostly agree, I think."));
    let pipeline = pipeline_with(
        built_index(),
        Arc::new(TermOverlapScorer),
        service,
        PipelineSettings::default(),
    );

    let outcome = pipeline.answer("basic plan history").unwrap();
    assert_eq!(outcome.verdict.status, VerdictStatus::InsufficientData);
    assert!(outcome.verdict.explanation.contains("invalid JSON"));
}

#[test]
fn test_unbuilt_index_and_empty_query() {
    let service = Arc::new(ScriptedService::replying(CONTRADICTION_REPLY));
    let unbuilt = Arc::new(SimilarityIndex::new(Arc::new(VocabularyEmbedder)));
    let pipeline = pipeline_with(
        unbuilt,
        Arc::new(TermOverlapScorer),
        Arc::clone(&service),
        PipelineSettings::default(),
    );

    assert!(matches!(
        pipeline.answer("basic plan history"),
        Err(ConcordError::NotBuilt)
    ));
    assert!(matches!(
        pipeline.answer("   "),
        Err(ConcordError::InvalidArgument(_))
    ));
    assert_eq!(service.request_count(), 0);
}

#[test]
fn test_rebuild_replaces_corpus() {
    let index = built_index();
    let replacement = vec![Passage::new(
        "s1",
        SourceClass::Blog,
        "blogs/sync.md",
        "Sync runs every 5 minutes.",
    )
    .unwrap()];

    assert_eq!(index.build(replacement).unwrap(), 1);
    assert!(index.contains("s1"));
    assert!(!index.contains("d1"));

    let results = index.retrieve("sync", None, 5).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id(), "s1");
}
