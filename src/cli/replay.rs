use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use action_locator::{
    DomSnapshot, ElementHandle, FailureClassifier, InMemoryLocatorHistory, Locator,
    LocatorHistory, ResolveStage, SnapshotSession,
};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tracing::{info, warn};

use super::context::CliContext;
use super::output::{emit, OutputFormat};
use crate::errors::CliError;
use crate::wiring::resolver_from_policy;

#[derive(Args, Clone, Debug)]
pub struct ResolveArgs {
    /// Recorded DOM snapshot (JSON)
    #[arg(long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Logical element name, used as the history key
    #[arg(long)]
    pub element: String,

    /// Locator strategy: id, name, xpath, css, class name, tag name, link text
    #[arg(long)]
    pub strategy: String,

    /// Locator query
    #[arg(long)]
    pub query: String,

    /// Seed the history with a last-known-good locator (`STRATEGY=QUERY`).
    ///
    /// The seed is the caller's assertion that the locator resolved in an
    /// earlier run; it is not checked here. The resolver still looks it up
    /// before using it and only records locators that resolve.
    #[arg(long, value_name = "STRATEGY=QUERY")]
    pub remember: Option<String>,

    /// Type this text into the resolved element
    #[arg(long, value_name = "TEXT")]
    pub type_text: Option<String>,
}

/// Outcome of a successful resolution
#[derive(Debug, Clone, Serialize)]
pub struct ResolveReport {
    pub element: String,
    pub stage: ResolveStage,
    pub healed: bool,
    pub locator: String,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzzy_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typed: Option<String>,
}

impl ResolveReport {
    fn human(&self) -> String {
        let mut out = if self.healed {
            format!(
                "Healed '{}' via {} stage: {} <{}>",
                self.element,
                self.stage.name(),
                self.locator,
                self.tag
            )
        } else {
            format!("Resolved '{}': {} <{}>", self.element, self.locator, self.tag)
        };
        if let Some(score) = self.fuzzy_score {
            out.push_str(&format!(" (score {score})"));
        }
        if let Some(text) = &self.typed {
            out.push_str(&format!("\nTyped: {text}"));
        }
        out
    }
}

pub fn cmd_resolve(args: ResolveArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let snapshot = read_snapshot(&args.snapshot)?;
    let primary = Locator::parse(&args.strategy, args.query.as_str()).map_err(CliError::from)?;

    let history = Arc::new(InMemoryLocatorHistory::new());
    if let Some(raw) = &args.remember {
        // caller-asserted seed, verified by the history stage before use
        history.record(&args.element, parse_remembered(raw)?);
    }

    let session = SnapshotSession::new(snapshot);
    let policy = ctx.policy();
    let resolver = resolver_from_policy(session, history, &policy);

    match resolver.resolve(&args.element, &primary) {
        Ok(resolution) => {
            let mut report = ResolveReport {
                element: args.element.clone(),
                stage: resolution.stage,
                healed: resolution.is_healed(),
                locator: resolution.locator.to_string(),
                tag: resolution.element.tag_name(),
                fuzzy_score: resolution.fuzzy_score,
                typed: None,
            };
            if let Some(text) = args.type_text {
                resolution.element.send_keys(&text)?;
                info!(element = %args.element, "typed into resolved element");
                report.typed = Some(resolution.element.typed_text());
            }
            emit(output, &report, ResolveReport::human)
        }
        Err(err) => {
            let failure = FailureClassifier::new().report(&err);
            warn!(
                element = %args.element,
                category = failure.category.as_str(),
                "resolution failed"
            );
            emit(output, &failure, |failure| failure.to_string())?;
            Err(CliError::Unresolved {
                element: args.element,
                category: failure.category,
            }
            .into())
        }
    }
}

fn read_snapshot(path: &Path) -> Result<DomSnapshot, CliError> {
    let file = File::open(path).map_err(|source| CliError::SnapshotRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(DomSnapshot::from_reader(BufReader::new(file))?)
}

/// Parse `STRATEGY=QUERY`; the query may itself contain `=`.
fn parse_remembered(raw: &str) -> Result<Locator, CliError> {
    let (strategy, query) = raw
        .split_once('=')
        .ok_or_else(|| CliError::RememberFormat(raw.to_string()))?;
    Ok(Locator::parse(strategy.trim(), query)?)
}
