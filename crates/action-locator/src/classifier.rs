//! Failure classification for reporting
//!
//! Maps any error message to a closed set of categories. Purely advisory:
//! nothing in the resolver branches on the result.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Human-facing failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureCategory {
    TimeoutError,
    ElementNotFound,
    NetworkIssue,
    UnknownError,
}

impl FailureCategory {
    /// Stable key for structured logs
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::TimeoutError => "timeout_error",
            FailureCategory::ElementNotFound => "element_not_found",
            FailureCategory::NetworkIssue => "network_issue",
            FailureCategory::UnknownError => "unknown_error",
        }
    }

    /// Label shown to people
    pub fn label(&self) -> &'static str {
        match self {
            FailureCategory::TimeoutError => "Timeout Error",
            FailureCategory::ElementNotFound => "Element Not Found",
            FailureCategory::NetworkIssue => "Network Issue",
            FailureCategory::UnknownError => "Unknown Error",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Substring rules, checked in order; first hit wins.
const RULES: &[(&str, FailureCategory)] = &[
    ("timeout", FailureCategory::TimeoutError),
    ("no such element", FailureCategory::ElementNotFound),
    ("connection", FailureCategory::NetworkIssue),
];

/// Classify an error by its message text.
pub fn classify(error: &(impl fmt::Display + ?Sized)) -> FailureCategory {
    classify_message(&error.to_string())
}

/// Classify a raw message.
pub fn classify_message(message: &str) -> FailureCategory {
    let lowered = message.to_lowercase();
    RULES
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, category)| *category)
        .unwrap_or(FailureCategory::UnknownError)
}

/// Stateless classifier handle for callers that want an object to hold.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureClassifier;

impl FailureClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, error: &(impl fmt::Display + ?Sized)) -> FailureCategory {
        classify(error)
    }

    /// Classify and keep the message alongside the category
    pub fn report(&self, error: &(impl fmt::Display + ?Sized)) -> FailureReport {
        let message = error.to_string();
        FailureReport {
            category: classify_message(&message),
            message,
        }
    }
}

/// Error message paired with its category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub category: FailureCategory,
    pub message: String,
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_category() {
        assert_eq!(
            classify_message("Timeout waiting for page"),
            FailureCategory::TimeoutError
        );
        assert_eq!(
            classify_message("Message: no such element: Unable to locate element"),
            FailureCategory::ElementNotFound
        );
        assert_eq!(
            classify_message("Connection refused by remote end"),
            FailureCategory::NetworkIssue
        );
        assert_eq!(
            classify_message("stale element reference"),
            FailureCategory::UnknownError
        );
        assert_eq!(classify_message(""), FailureCategory::UnknownError);
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(
            classify_message("connection timeout"),
            FailureCategory::TimeoutError
        );
        assert_eq!(
            classify_message("no such element after connection reset"),
            FailureCategory::ElementNotFound
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify_message("TIMEOUT"), FailureCategory::TimeoutError);
        assert_eq!(
            classify_message("No Such Element"),
            FailureCategory::ElementNotFound
        );
    }

    #[test]
    fn test_report_display() {
        let report = FailureClassifier::new().report("connection lost");
        assert_eq!(report.category, FailureCategory::NetworkIssue);
        assert_eq!(report.to_string(), "[Network Issue] connection lost");
    }
}
