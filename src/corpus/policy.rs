//! Source-class trust policy: retrieval weights and the authority order

use super::SourceClass;
use crate::error::{ConcordError, Result};
use std::collections::{HashMap, HashSet};

/// Neutral weight for classes absent from the map
pub const NEUTRAL_WEIGHT: f32 = 1.0;

/// Linear weight applied to raw similarity per source class
#[derive(Debug, Clone, PartialEq)]
pub struct SourceWeights {
    weights: HashMap<SourceClass, f32>,
    fallback: f32,
}

impl SourceWeights {
    /// Weights with no explicit entries; every class gets the neutral weight
    pub fn neutral() -> Self {
        Self {
            weights: HashMap::new(),
            fallback: NEUTRAL_WEIGHT,
        }
    }

    pub fn from_map(weights: HashMap<SourceClass, f32>) -> Self {
        Self {
            weights,
            fallback: NEUTRAL_WEIGHT,
        }
    }

    /// Build from string keys as they appear in configuration
    pub fn from_named<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a f32)>,
    {
        let mut weights = HashMap::new();
        for (name, weight) in entries {
            let class: SourceClass = name.parse()?;
            weights.insert(class, *weight);
        }
        Ok(Self::from_map(weights))
    }

    pub fn with_weight(mut self, class: SourceClass, weight: f32) -> Self {
        self.weights.insert(class, weight);
        self
    }

    pub fn with_fallback(mut self, fallback: f32) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn weight(&self, class: SourceClass) -> f32 {
        self.weights.get(&class).copied().unwrap_or(self.fallback)
    }
}

impl Default for SourceWeights {
    /// docs=1.2, blog=1.0, forum=0.9
    fn default() -> Self {
        Self::neutral()
            .with_weight(SourceClass::Docs, 1.2)
            .with_weight(SourceClass::Blog, 1.0)
            .with_weight(SourceClass::Forum, 0.9)
    }
}

/// Trust order used to pick an answer when sources disagree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityPolicy {
    order: Vec<SourceClass>,
}

impl AuthorityPolicy {
    /// `order` lists classes from highest to lowest authority
    pub fn new(order: Vec<SourceClass>) -> Result<Self> {
        if order.is_empty() {
            return Err(ConcordError::InvalidArgument(
                "Authority order cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for class in &order {
            if !seen.insert(*class) {
                return Err(ConcordError::InvalidArgument(format!(
                    "Source class '{}' appears twice in authority order",
                    class
                )));
            }
        }

        Ok(Self { order })
    }

    pub fn order(&self) -> &[SourceClass] {
        &self.order
    }

    /// Position in the order (0 = highest); unlisted classes rank last
    pub fn rank(&self, class: SourceClass) -> usize {
        self.order
            .iter()
            .position(|c| *c == class)
            .unwrap_or(self.order.len())
    }

    /// Human-readable form, e.g. `docs (highest) > blog > forum (lowest)`
    pub fn describe(&self) -> String {
        let last = self.order.len() - 1;
        self.order
            .iter()
            .enumerate()
            .map(|(i, class)| match i {
                0 if last == 0 => format!("{} (only source)", class),
                0 => format!("{} (highest)", class),
                i if i == last => format!("{} (lowest)", class),
                _ => class.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

impl Default for AuthorityPolicy {
    fn default() -> Self {
        Self {
            order: vec![SourceClass::Docs, SourceClass::Blog, SourceClass::Forum],
        }
    }
}
