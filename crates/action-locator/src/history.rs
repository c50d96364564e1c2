//! Last-known-good locator memory, keyed by logical element name

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::types::Locator;

/// Locator history trait
///
/// Implementations must serialize writers: several resolvers may share one
/// store through an `Arc`.
pub trait LocatorHistory: Send + Sync {
    /// Store or overwrite the entry for `name`. Returns `true` when the stored
    /// value changed.
    fn record(&self, name: &str, locator: Locator) -> bool;

    /// Last locator that resolved `name`, if any
    fn lookup(&self, name: &str) -> Option<Locator>;

    /// Drop every entry
    fn reset(&self);

    /// Number of remembered element names
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries, sorted by element name
    fn entries(&self) -> Vec<(String, Locator)>;
}

/// In-memory history store
///
/// Entries live as long as the store; nothing is evicted.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLocatorHistory {
    entries: Arc<RwLock<HashMap<String, Locator>>>,
}

impl InMemoryLocatorHistory {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with known-good locators
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Locator)>,
        K: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(name, locator)| (name.into(), locator))
            .collect();
        Self {
            entries: Arc::new(RwLock::new(map)),
        }
    }
}

impl LocatorHistory for InMemoryLocatorHistory {
    fn record(&self, name: &str, locator: Locator) -> bool {
        let mut entries = self.entries.write();
        match entries.get(name) {
            Some(existing) if *existing == locator => false,
            _ => {
                debug!(element = name, locator = %locator, "recording locator");
                entries.insert(name.to_string(), locator);
                true
            }
        }
    }

    fn lookup(&self, name: &str) -> Option<Locator> {
        self.entries.read().get(name).cloned()
    }

    fn reset(&self) {
        self.entries.write().clear();
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn entries(&self) -> Vec<(String, Locator)> {
        let mut entries = self
            .entries
            .read()
            .iter()
            .map(|(name, locator)| (name.clone(), locator.clone()))
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
