use super::classify::cmd_classify;
use super::env::CliArgs;
use super::policy::cmd_policy;
use super::replay::cmd_resolve;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Resolve(args) => cmd_resolve(args, ctx, cli.output),
        Commands::Classify(args) => cmd_classify(args, cli.output),
        Commands::Policy(args) => cmd_policy(args, ctx, cli.output),
    }
}
