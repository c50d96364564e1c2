//! Error types for locator system

use thiserror::Error;

use crate::classifier::{classify, FailureCategory};
use crate::types::Locator;

/// Failure reported by the browser session collaborator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No node matched the locator
    #[error("no such element: {0}")]
    NotFound(String),

    /// The session did not answer in time
    #[error("timeout: {0}")]
    Timeout(String),

    /// The session connection is broken
    #[error("connection failure: {0}")]
    Connection(String),

    /// Anything else the session raised
    #[error("session error: {0}")]
    Other(String),
}

impl SessionError {
    /// Check if this is the recoverable "not found" condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound(_))
    }

    /// Check if the session itself is unhealthy
    pub fn is_session_failure(&self) -> bool {
        matches!(self, SessionError::Timeout(_) | SessionError::Connection(_))
    }
}

/// Error returned by [`crate::SelfHealingResolver::resolve`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Every stage ran out of locators to try
    #[error("no such element: '{element}' not found after trying [{}]", render_attempts(.attempted))]
    ElementNotFound {
        element: String,
        attempted: Vec<Locator>,
    },

    /// The session failed for a reason other than "not found"
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ResolveError {
    /// Locators attempted before giving up, in order
    pub fn attempted(&self) -> &[Locator] {
        match self {
            ResolveError::ElementNotFound { attempted, .. } => attempted,
            ResolveError::Session(_) => &[],
        }
    }

    /// Human-facing failure category
    pub fn category(&self) -> FailureCategory {
        classify(self)
    }
}

fn render_attempts(attempted: &[Locator]) -> String {
    attempted
        .iter()
        .map(|locator| locator.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Construction and input errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// Locator could not be built from its parts
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    /// DOM snapshot could not be decoded
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}
