//! Prompt construction for the consistency check

use super::ReasoningRequest;
use crate::corpus::AuthorityPolicy;
use crate::retrieval::ScoredPassage;

pub const SYSTEM_PROMPT: &str =
    "You analyze contradictions across retrieved evidence and respond ONLY in JSON.";

/// Evidence block: one `[SOURCE: <class>] <text>` entry per passage
pub fn render_evidence(evidence: &[ScoredPassage]) -> String {
    evidence
        .iter()
        .map(|item| format!("[SOURCE: {}] {}", item.source_class(), item.text().trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Full request for one query and its reranked evidence
pub fn build_request(
    query: &str,
    evidence: &[ScoredPassage],
    policy: &AuthorityPolicy,
) -> ReasoningRequest {
    let authority = policy
        .describe()
        .split(" > ")
        .map(|entry| format!("   - {}", entry))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        r#"You are an AI system that MUST output ONLY valid JSON.

USER QUESTION:
"""{query}"""

EVIDENCE FROM DIFFERENT SOURCES:
---
{evidence}
---

INSTRUCTIONS (FOLLOW EXACTLY):
1. Compare all evidence and determine if sources AGREE or CONTRADICT.
2. Authority ranking:
{authority}
3. Produce ONLY valid JSON with this exact structure:

{{
  "status": "consistent" | "contradiction" | "insufficient_data",
  "explanation": "Short explanation of agreement or contradiction.",
  "authoritative_answer": "Final answer using highest-authority source."
}}

4. DO NOT output anything outside the JSON.
5. DO NOT add comments, markdown, or extra explanations.
6. If unsure, use "insufficient_data".
"#,
        query = query.trim(),
        evidence = render_evidence(evidence),
        authority = authority,
    );

    ReasoningRequest {
        system: SYSTEM_PROMPT.to_string(),
        prompt,
    }
}
