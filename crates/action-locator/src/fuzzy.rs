//! Fuzzy DOM matching - last-resort recovery
//!
//! Scores every element of a fresh snapshot against the broken locator's
//! query and keeps the single best node. Ties go to the node met first in
//! document order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::snapshot::{is_name_token, DomNode, DomSnapshot};
use crate::types::CandidateMatch;

/// Pluggable string similarity, scored 0-100
pub trait Similarity: Send + Sync {
    fn score(&self, a: &str, b: &str) -> u8;
}

impl<F> Similarity for F
where
    F: Fn(&str, &str) -> u8 + Send + Sync,
{
    fn score(&self, a: &str, b: &str) -> u8 {
        self(a, b)
    }
}

/// Best alignment of the shorter string against equal-length windows of the
/// longer one, each window scored by normalized Levenshtein distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialRatio;

impl Similarity for PartialRatio {
    fn score(&self, a: &str, b: &str) -> u8 {
        if a.is_empty() || b.is_empty() {
            return 0;
        }
        let (short, long) = if a.chars().count() <= b.chars().count() {
            (a, b)
        } else {
            (b, a)
        };
        if long.contains(short) {
            return 100;
        }

        let width = short.chars().count();
        let bounds = long
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(long.len()))
            .collect::<Vec<_>>();
        let mut best = 0.0_f64;
        for start in 0..bounds.len().saturating_sub(width) {
            let window = &long[bounds[start]..bounds[start + width]];
            let distance = strsim::levenshtein(short, window);
            let ratio = 1.0 - distance as f64 / width as f64;
            if ratio > best {
                best = ratio;
            }
        }
        (best * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// What text of a node gets scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeSerialization {
    /// The element's own tag, attributes and direct text
    #[default]
    Shallow,

    /// The element and everything nested inside it
    Subtree,
}

impl NodeSerialization {
    fn render(&self, node: &DomNode) -> String {
        match self {
            NodeSerialization::Shallow => node.shallow_html(),
            NodeSerialization::Subtree => node.outer_html(),
        }
    }
}

/// Fuzzy DOM matcher
#[derive(Clone)]
pub struct FuzzyMatcher {
    similarity: Arc<dyn Similarity>,
    min_score: u8,
    serialization: NodeSerialization,
}

impl FuzzyMatcher {
    /// Create a matcher with a custom similarity function
    pub fn new(similarity: impl Similarity + 'static) -> Self {
        Self {
            similarity: Arc::new(similarity),
            min_score: 1,
            serialization: NodeSerialization::default(),
        }
    }

    /// Minimum score a winner must reach; values below 1 are treated as 1
    pub fn with_min_score(mut self, min_score: u8) -> Self {
        self.min_score = min_score.max(1);
        self
    }

    pub fn with_serialization(mut self, serialization: NodeSerialization) -> Self {
        self.serialization = serialization;
        self
    }

    pub fn min_score(&self) -> u8 {
        self.min_score
    }

    pub fn serialization(&self) -> NodeSerialization {
        self.serialization
    }

    /// Highest-scoring element for `query`, or `None` when the document is
    /// empty or nothing reaches the minimum score.
    pub fn best_match(&self, snapshot: &DomSnapshot, query: &str) -> Option<CandidateMatch> {
        let mut best: Option<CandidateMatch> = None;
        for (index, node) in snapshot.elements().enumerate() {
            // the healed locator is `//tag`, so the tag must be a valid name step
            if !is_name_token(&node.tag) {
                trace!(index, tag = %node.tag, "skipping node with unaddressable tag");
                continue;
            }
            let rendered = self.serialization.render(node);
            let score = self.similarity.score(&rendered, query);
            trace!(index, tag = %node.tag, score, "scored node");
            if best.as_ref().map_or(true, |current| score > current.score) {
                best = Some(CandidateMatch {
                    index,
                    tag: node.tag.to_ascii_lowercase(),
                    score,
                });
            }
        }

        match best {
            Some(candidate) if candidate.score >= self.min_score => {
                debug!(
                    tag = %candidate.tag,
                    index = candidate.index,
                    score = candidate.score,
                    "fuzzy match selected"
                );
                Some(candidate)
            }
            Some(candidate) => {
                debug!(
                    best = candidate.score,
                    min = self.min_score,
                    "no fuzzy candidate reached minimum score"
                );
                None
            }
            None => {
                debug!("document has no element nodes");
                None
            }
        }
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(PartialRatio)
    }
}

impl std::fmt::Debug for FuzzyMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuzzyMatcher")
            .field("min_score", &self.min_score)
            .field("serialization", &self.serialization)
            .finish()
    }
}
