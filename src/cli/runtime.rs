use std::path::Path;

use anyhow::{Context, Result};
use selfheal_policy_center::{load_policy, HealPolicy};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
pub fn init_logging(level: &str, debug: bool, json: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    let plain = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    let structured = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(plain)
        .with(structured)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Load the layered healing policy (defaults, file, env, CLI env).
pub fn load_heal_policy(path: Option<&Path>) -> Result<HealPolicy> {
    let policy = match path {
        Some(path) => load_policy(Some(path))
            .with_context(|| format!("Failed to load policy from {}", path.display()))?,
        None => load_policy(None).context("Failed to load policy")?,
    };
    Ok(policy)
}
