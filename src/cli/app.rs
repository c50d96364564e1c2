use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, info};

use super::context::CliContext;
use super::dispatch::dispatch;
use super::env::CliArgs;
use super::runtime::{init_logging, load_heal_policy};

pub fn run() -> Result<()> {
    let cli = CliArgs::parse();

    // logging settings live in the policy, so it is loaded first
    let policy = load_heal_policy(cli.policy.as_deref())?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| policy.logging.level.clone());
    init_logging(&level, cli.debug, cli.json_logs || policy.logging.json)?;

    info!("Starting selfheal v{}", env!("CARGO_PKG_VERSION"));
    debug!(rev = policy.rev, "healing policy loaded");

    let ctx = CliContext::new(policy, cli.policy.clone());
    match dispatch(&cli, &ctx) {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {}", err);
            Err(err)
        }
    }
}
