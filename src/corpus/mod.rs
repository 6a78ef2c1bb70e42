//! Passages and the source classes that govern their authority
//!
//! A `Passage` is the atomic retrievable unit handed over by ingestion. It is
//! immutable once created; the index owns the passage set for its lifetime.

mod policy;

pub use policy::{AuthorityPolicy, SourceWeights, NEUTRAL_WEIGHT};

use crate::error::{ConcordError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Auxiliary passage metadata, not interpreted by retrieval
pub type Attributes = BTreeMap<String, String>;

/// Enumerated category a passage belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceClass {
    /// Official documentation
    #[serde(alias = "doc")]
    Docs,
    /// Blog posts
    #[serde(alias = "blogs")]
    Blog,
    /// Community forum posts
    #[serde(alias = "forums")]
    Forum,
}

impl SourceClass {
    pub const ALL: [SourceClass; 3] = [SourceClass::Docs, SourceClass::Blog, SourceClass::Forum];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceClass::Docs => "docs",
            SourceClass::Blog => "blog",
            SourceClass::Forum => "forum",
        }
    }

    /// Directory name used by the on-disk corpus layout
    pub fn dir_name(&self) -> &'static str {
        match self {
            SourceClass::Docs => "docs",
            SourceClass::Blog => "blogs",
            SourceClass::Forum => "forums",
        }
    }
}

impl fmt::Display for SourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SourceClass {
    type Err = ConcordError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docs" | "doc" => Ok(SourceClass::Docs),
            "blog" | "blogs" => Ok(SourceClass::Blog),
            "forum" | "forums" => Ok(SourceClass::Forum),
            other => Err(ConcordError::InvalidArgument(format!(
                "Unknown source class: '{}'",
                other
            ))),
        }
    }
}

/// Immutable unit of retrievable text with provenance
///
/// Deserialization goes through `Passage::new`, so the same checks apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PassageRecord")]
pub struct Passage {
    id: String,
    source_class: SourceClass,
    origin: String,
    text: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    attributes: Attributes,
}

/// Unchecked wire form of `Passage`
#[derive(Deserialize)]
struct PassageRecord {
    id: String,
    source_class: SourceClass,
    origin: String,
    text: String,
    #[serde(default)]
    attributes: Attributes,
}

impl TryFrom<PassageRecord> for Passage {
    type Error = ConcordError;

    fn try_from(record: PassageRecord) -> Result<Self> {
        let mut passage = Passage::new(record.id, record.source_class, record.origin, record.text)?;
        passage.attributes = record.attributes;
        Ok(passage)
    }
}

impl Passage {
    /// Create a passage, rejecting empty ids and blank text
    pub fn new(
        id: impl Into<String>,
        source_class: SourceClass,
        origin: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Self> {
        let id = id.into();
        let text = text.into();

        if id.trim().is_empty() {
            return Err(ConcordError::InvalidArgument(
                "Passage id cannot be empty".to_string(),
            ));
        }
        if text.trim().is_empty() {
            return Err(ConcordError::InvalidArgument(format!(
                "Passage {} has empty text",
                id
            )));
        }

        Ok(Self {
            id,
            source_class,
            origin: origin.into(),
            text,
            attributes: Attributes::new(),
        })
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source_class(&self) -> SourceClass {
        self.source_class
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// First `max_chars` characters of the body, cut on a char boundary
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_class_parsing() {
        assert_eq!("docs".parse::<SourceClass>().unwrap(), SourceClass::Docs);
        assert_eq!("Forums".parse::<SourceClass>().unwrap(), SourceClass::Forum);
        assert_eq!("blogs".parse::<SourceClass>().unwrap(), SourceClass::Blog);
        assert!("wiki".parse::<SourceClass>().is_err());
    }

    #[test]
    fn test_source_class_serde_accepts_plural() {
        let class: SourceClass = serde_json::from_str("\"forums\"").unwrap();
        assert_eq!(class, SourceClass::Forum);
        assert_eq!(serde_json::to_string(&SourceClass::Blog).unwrap(), "\"blog\"");
    }

    #[test]
    fn test_passage_rejects_blank_text() {
        assert!(Passage::new("p1", SourceClass::Docs, "a.md", "   \n").is_err());
        assert!(Passage::new("", SourceClass::Docs, "a.md", "text").is_err());
    }

    #[test]
    fn test_deserialize_applies_passage_checks() {
        let blank = r#"{"id": "p1", "source_class": "docs", "origin": "a.md", "text": "  "}"#;
        assert!(serde_json::from_str::<Passage>(blank).is_err());

        let no_id = r#"{"id": "", "source_class": "docs", "origin": "a.md", "text": "body"}"#;
        assert!(serde_json::from_str::<Passage>(no_id).is_err());

        let passage = Passage::new("p1", SourceClass::Blog, "b.md", "body")
            .unwrap()
            .with_attribute("section", "Intro");
        let json = serde_json::to_string(&passage).unwrap();
        assert_eq!(serde_json::from_str::<Passage>(&json).unwrap(), passage);
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let passage = Passage::new("p1", SourceClass::Forum, "t.txt", "héllo wörld").unwrap();
        assert_eq!(passage.preview(2), "hé");
        assert_eq!(passage.preview(100), "héllo wörld");
    }

    #[test]
    fn test_attributes() {
        let passage = Passage::new("p1", SourceClass::Docs, "a.md", "body")
            .unwrap()
            .with_attribute("section", "Plans");
        assert_eq!(passage.attributes().get("section").map(String::as_str), Some("Plans"));
    }
}
