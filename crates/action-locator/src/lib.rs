//! Self-healing element locator
//!
//! Resolves a named element when its recorded locator stops matching:
//! - Primary locator lookup
//! - Last-known-good locator from history
//! - Strategy rewrite heuristics (ID → XPath and friends)
//! - Fuzzy DOM matching against a fresh document snapshot
//! - Failure classification for reporting

pub mod classifier;
pub mod errors;
pub mod fuzzy;
pub mod history;
pub mod resolver;
pub mod session;
pub mod snapshot;
pub mod strategies;
pub mod types;

pub use classifier::*;
pub use errors::*;
pub use fuzzy::*;
pub use history::*;
pub use resolver::*;
pub use session::*;
pub use snapshot::*;
pub use strategies::*;
pub use types::*;
