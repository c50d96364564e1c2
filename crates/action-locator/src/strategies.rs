//! Rewrite heuristics tried after history and before the fuzzy scan
//!
//! Each heuristic is keyed by the strategy of the failed locator and maps it
//! to an equivalent locator in another strategy. The chain is ordered; the
//! resolver stops at the first rewrite that resolves.

use std::sync::Arc;

use crate::types::{Locator, LocatorStrategy};

/// Pure locator rewrite
pub trait RewriteHeuristic: Send + Sync {
    /// Stable name, used for policy filtering and logs
    fn name(&self) -> &'static str;

    /// Strategy this heuristic applies to
    fn source(&self) -> LocatorStrategy;

    /// Rewrite `locator`, or `None` when the heuristic does not apply
    fn rewrite(&self, locator: &Locator) -> Option<Locator>;
}

/// `id=v` → `//*[@id='v']`
#[derive(Debug, Clone, Copy, Default)]
pub struct IdToXPath;

impl RewriteHeuristic for IdToXPath {
    fn name(&self) -> &'static str {
        "id-to-xpath"
    }

    fn source(&self) -> LocatorStrategy {
        LocatorStrategy::Id
    }

    fn rewrite(&self, locator: &Locator) -> Option<Locator> {
        attribute_xpath(locator, self.source(), "id")
    }
}

/// `name=v` → `//*[@name='v']`
#[derive(Debug, Clone, Copy, Default)]
pub struct NameToXPath;

impl RewriteHeuristic for NameToXPath {
    fn name(&self) -> &'static str {
        "name-to-xpath"
    }

    fn source(&self) -> LocatorStrategy {
        LocatorStrategy::Name
    }

    fn rewrite(&self, locator: &Locator) -> Option<Locator> {
        attribute_xpath(locator, self.source(), "name")
    }
}

fn attribute_xpath(locator: &Locator, source: LocatorStrategy, attr: &str) -> Option<Locator> {
    if locator.strategy() != source || locator.query().is_empty() {
        return None;
    }
    Some(Locator::xpath(format!(
        "//*[@{}={}]",
        attr,
        xpath_literal(locator.query())
    )))
}

/// Quote a string as an XPath 1.0 literal.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    let parts = value
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect::<Vec<_>>()
        .join(", \"'\", ");
    format!("concat({})", parts)
}

/// Ordered list of rewrite heuristics
#[derive(Clone)]
pub struct StrategyChain {
    heuristics: Vec<Arc<dyn RewriteHeuristic>>,
}

impl StrategyChain {
    /// Chain with no heuristics
    pub fn empty() -> Self {
        Self {
            heuristics: Vec::new(),
        }
    }

    /// Append a heuristic at the end of the chain
    pub fn push(mut self, heuristic: impl RewriteHeuristic + 'static) -> Self {
        self.heuristics.push(Arc::new(heuristic));
        self
    }

    /// Drop heuristics whose name appears in `names`
    pub fn without<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.heuristics
            .retain(|h| !names.iter().any(|name| name.as_ref() == h.name()));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.heuristics.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.heuristics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heuristics.is_empty()
    }

    /// Rewrites applicable to `locator`, in chain order, paired with the
    /// heuristic name. Rewrites identical to the input are dropped.
    pub fn candidates(&self, locator: &Locator) -> Vec<(&'static str, Locator)> {
        self.heuristics
            .iter()
            .filter_map(|h| h.rewrite(locator).map(|rewritten| (h.name(), rewritten)))
            .filter(|(_, rewritten)| rewritten != locator)
            .collect()
    }
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self::empty().push(IdToXPath).push(NameToXPath)
    }
}

impl std::fmt::Debug for StrategyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyChain")
            .field("heuristics", &self.names())
            .finish()
    }
}
