//! Errors surfaced by the replay driver

use std::path::PathBuf;

use action_locator::{FailureCategory, LocatorError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to open snapshot {}: {source}", path.display())]
    SnapshotRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error("remembered locator must look like STRATEGY=QUERY, got '{0}'")]
    RememberFormat(String),

    /// Resolution failed; the report has already been printed
    #[error("element '{element}' could not be resolved ({category})")]
    Unresolved {
        element: String,
        category: FailureCategory,
    },
}
