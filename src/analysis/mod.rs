//! Authority-aware consistency analysis over reranked evidence
//!
//! The analyzer asks an external reasoning service whether the evidence
//! agrees, then decodes the answer defensively. `analyze` never fails: any
//! service error or malformed output becomes an `insufficient_data` verdict.

mod extract;
mod prompt;
mod service;
mod verdict;

pub use extract::extract_json_object;
pub use prompt::{build_request, render_evidence, SYSTEM_PROMPT};
pub use service::{
    ChatClientConfig, ChatCompletionsClient, ReasoningError, ReasoningRequest, ReasoningService,
};
pub use verdict::{ConsistencyVerdict, VerdictStatus};

use crate::corpus::AuthorityPolicy;
use crate::retrieval::ScoredPassage;
use std::sync::Arc;
use tracing::{debug, warn};

/// Classifies an evidence set as consistent, contradictory or insufficient
#[derive(Clone)]
pub struct ConsistencyAnalyzer {
    service: Arc<dyn ReasoningService>,
    policy: AuthorityPolicy,
}

impl ConsistencyAnalyzer {
    pub fn new(service: Arc<dyn ReasoningService>, policy: AuthorityPolicy) -> Self {
        Self { service, policy }
    }

    pub fn policy(&self) -> &AuthorityPolicy {
        &self.policy
    }

    /// Verdict for `query` given ordered `evidence`; never returns an error
    pub fn analyze(&self, query: &str, evidence: &[ScoredPassage]) -> ConsistencyVerdict {
        if evidence.is_empty() {
            debug!("No evidence for query, skipping reasoning service");
            return ConsistencyVerdict::insufficient("No evidence was retrieved for this query.");
        }

        let request = build_request(query, evidence, &self.policy);

        let raw = match self.service.complete(&request) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Reasoning service {} failed: {}", self.service.model_name(), e);
                return ConsistencyVerdict::insufficient(format!("Model error: {}", e));
            }
        };

        Self::interpret(&raw)
    }

    /// Decode raw service output into a verdict, degrading on bad output
    pub fn interpret(raw: &str) -> ConsistencyVerdict {
        let Some(json) = extract_json_object(raw) else {
            warn!("Reasoning service output contained no JSON object");
            return ConsistencyVerdict::insufficient(
                "Model returned invalid JSON: no JSON object found.",
            );
        };

        match ConsistencyVerdict::from_json(json) {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!("Reasoning service output failed to parse: {}", e);
                ConsistencyVerdict::insufficient(format!("Model returned invalid JSON: {}", e))
            }
        }
    }
}
