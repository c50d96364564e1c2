//! Core types for locator system

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::LocatorError;

/// Locator strategy enumeration
///
/// Mirrors the WebDriver `By` strategies a recorded locator can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorStrategy {
    /// `id` attribute match
    Id,

    /// `name` attribute match
    Name,

    /// XPath expression
    XPath,

    /// CSS selector
    Css,

    /// Single class name
    ClassName,

    /// Tag name
    TagName,

    /// Exact anchor text
    LinkText,

    /// Anchor text substring
    PartialLinkText,
}

impl LocatorStrategy {
    /// Get strategy name as string (WebDriver spelling)
    pub fn name(&self) -> &'static str {
        match self {
            LocatorStrategy::Id => "id",
            LocatorStrategy::Name => "name",
            LocatorStrategy::XPath => "xpath",
            LocatorStrategy::Css => "css selector",
            LocatorStrategy::ClassName => "class name",
            LocatorStrategy::TagName => "tag name",
            LocatorStrategy::LinkText => "link text",
            LocatorStrategy::PartialLinkText => "partial link text",
        }
    }

    /// Short label used when rendering a locator
    fn label(&self) -> &'static str {
        match self {
            LocatorStrategy::Id => "id",
            LocatorStrategy::Name => "name",
            LocatorStrategy::XPath => "xpath",
            LocatorStrategy::Css => "css",
            LocatorStrategy::ClassName => "class",
            LocatorStrategy::TagName => "tag",
            LocatorStrategy::LinkText => "link",
            LocatorStrategy::PartialLinkText => "partial-link",
        }
    }
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LocatorStrategy {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "id" => Ok(LocatorStrategy::Id),
            "name" => Ok(LocatorStrategy::Name),
            "xpath" => Ok(LocatorStrategy::XPath),
            "css" | "css selector" => Ok(LocatorStrategy::Css),
            "class" | "class name" => Ok(LocatorStrategy::ClassName),
            "tag" | "tag name" => Ok(LocatorStrategy::TagName),
            "link" | "link text" => Ok(LocatorStrategy::LinkText),
            "partial link" | "partial link text" => Ok(LocatorStrategy::PartialLinkText),
            _ => Err(LocatorError::InvalidLocator(format!(
                "unknown locator strategy '{}'",
                s
            ))),
        }
    }
}

/// How to find an element: a strategy plus its query string.
///
/// Immutable once built; equality is by `(strategy, query)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    strategy: LocatorStrategy,
    query: String,
}

impl Locator {
    /// Create a locator from an already-typed strategy
    pub fn new(strategy: LocatorStrategy, query: impl Into<String>) -> Self {
        Self {
            strategy,
            query: query.into(),
        }
    }

    /// Build a locator from untyped input, rejecting unknown strategies and
    /// blank queries.
    pub fn parse(strategy: &str, query: impl Into<String>) -> Result<Self, LocatorError> {
        let strategy = strategy.parse::<LocatorStrategy>()?;
        let query = query.into();
        if query.trim().is_empty() {
            return Err(LocatorError::InvalidLocator(format!(
                "empty query for {} locator",
                strategy
            )));
        }
        Ok(Self::new(strategy, query))
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::Id, value)
    }

    pub fn name(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::Name, value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::XPath, value)
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::Css, value)
    }

    pub fn strategy(&self) -> LocatorStrategy {
        self.strategy
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.strategy.label(), self.query)
    }
}

/// Stage of the resolution state machine that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStage {
    Primary,
    History,
    Heuristic,
    Fuzzy,
}

impl ResolveStage {
    pub fn name(&self) -> &'static str {
        match self {
            ResolveStage::Primary => "primary",
            ResolveStage::History => "history",
            ResolveStage::Heuristic => "heuristic",
            ResolveStage::Fuzzy => "fuzzy",
        }
    }

    /// Whether the element was recovered rather than found by its own locator
    pub fn is_healed(&self) -> bool {
        !matches!(self, ResolveStage::Primary)
    }
}

impl fmt::Display for ResolveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-stage enable switches. The primary lookup always runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageToggles {
    pub history: bool,
    pub heuristics: bool,
    pub fuzzy: bool,
}

impl Default for StageToggles {
    fn default() -> Self {
        Self {
            history: true,
            heuristics: true,
            fuzzy: true,
        }
    }
}

/// Fuzzy match candidate: one scored element node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMatch {
    /// Position of the node in document order
    pub index: usize,

    /// Element tag name
    pub tag: String,

    /// Similarity score (0-100)
    pub score: u8,
}

impl CandidateMatch {
    /// Tag-only XPath used to re-resolve the winning node live.
    ///
    /// Only the tag survives; attributes of the matched node are dropped, so
    /// the first same-tag element in the live document is what comes back.
    pub fn healed_locator(&self) -> Locator {
        Locator::xpath(format!("//{}", self.tag))
    }
}

/// Outcome of a single resolution stage
#[derive(Debug)]
pub enum StageOutcome<E> {
    /// The stage resolved an element via the given locator
    Found(E, Locator),

    /// The stage ran and every locator it tried was not found
    NotFound,

    /// The stage had nothing to try (no entry, no rewrite, no candidate)
    Skipped,
}

impl<E> StageOutcome<E> {
    pub fn is_found(&self) -> bool {
        matches!(self, StageOutcome::Found(..))
    }
}

/// Element resolution result
#[derive(Debug)]
pub struct Resolution<E> {
    /// Resolved element handle
    pub element: E,

    /// Locator that produced the element
    pub locator: Locator,

    /// Stage that succeeded
    pub stage: ResolveStage,

    /// Similarity score when the fuzzy stage succeeded
    pub fuzzy_score: Option<u8>,
}

impl<E> Resolution<E> {
    pub fn new(element: E, locator: Locator, stage: ResolveStage) -> Self {
        Self {
            element,
            locator,
            stage,
            fuzzy_score: None,
        }
    }

    /// Attach the fuzzy score that selected this element
    pub fn with_score(mut self, score: u8) -> Self {
        self.fuzzy_score = Some(score);
        self
    }

    pub fn is_healed(&self) -> bool {
        self.stage.is_healed()
    }

    pub fn into_element(self) -> E {
        self.element
    }
}
