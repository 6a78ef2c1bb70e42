//! Consistency verdict and its lenient decoding from model JSON

use super::ReasoningError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Outcome class of a consistency check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Consistent,
    Contradiction,
    InsufficientData,
}

impl VerdictStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictStatus::Consistent => "consistent",
            VerdictStatus::Contradiction => "contradiction",
            VerdictStatus::InsufficientData => "insufficient_data",
        }
    }

    /// Exact wire value, ignoring surrounding whitespace and case
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "consistent" => Some(VerdictStatus::Consistent),
            "contradiction" => Some(VerdictStatus::Contradiction),
            "insufficient_data" => Some(VerdictStatus::InsufficientData),
            _ => None,
        }
    }
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured answer of the consistency analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyVerdict {
    pub status: VerdictStatus,
    pub explanation: String,
    pub authoritative_answer: String,
}

impl ConsistencyVerdict {
    pub fn new(
        status: VerdictStatus,
        explanation: impl Into<String>,
        authoritative_answer: impl Into<String>,
    ) -> Self {
        Self {
            status,
            explanation: explanation.into(),
            authoritative_answer: authoritative_answer.into(),
        }
    }

    /// Degraded verdict: `insufficient_data`, the reason, and no answer
    pub fn insufficient(explanation: impl Into<String>) -> Self {
        Self::new(VerdictStatus::InsufficientData, explanation, "")
    }

    /// Decode a JSON object produced by the reasoning service
    ///
    /// Missing or null fields become empty strings. A missing or unknown
    /// `status` becomes `insufficient_data`; a recognized status is kept as is.
    pub fn from_json(json: &str) -> Result<Self, ReasoningError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ReasoningError::MalformedResponse(e.to_string()))?;

        let object = value.as_object().ok_or_else(|| {
            ReasoningError::MalformedResponse("Top-level JSON value is not an object".to_string())
        })?;

        let field = |name: &str| -> String {
            match object.get(name) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            }
        };

        let raw_status = field("status");
        let mut explanation = field("explanation");

        let status = match VerdictStatus::parse(&raw_status) {
            Some(status) => status,
            None => {
                tracing::warn!("Reasoning service returned unrecognized status '{}'", raw_status);
                if explanation.is_empty() {
                    explanation = format!("Model returned unrecognized status '{}'.", raw_status);
                }
                VerdictStatus::InsufficientData
            }
        };

        Ok(Self {
            status,
            explanation,
            authoritative_answer: field("authoritative_answer"),
        })
    }
}
