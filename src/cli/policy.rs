use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use selfheal_policy_center::{HealPolicy, PolicyCenter};

use super::context::CliContext;
use super::output::{emit, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct PolicyArgs {
    #[command(subcommand)]
    pub command: PolicyCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum PolicyCommand {
    /// Print the effective policy
    Show(PolicyShowArgs),
    /// Apply an in-process override and print the result
    Override(PolicyOverrideArgs),
}

#[derive(Args, Clone, Debug)]
pub struct PolicyShowArgs {
    /// Include where each value came from
    #[arg(long)]
    pub provenance: bool,
}

#[derive(Args, Clone, Debug)]
pub struct PolicyOverrideArgs {
    /// Dot-path to override, e.g. fuzzy.min_score
    pub path: String,
    /// Override value as JSON literal (e.g. 40, false, "subtree")
    pub value: String,
}

pub fn cmd_policy(args: PolicyArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    match args.command {
        PolicyCommand::Show(show) => {
            let mut policy = (*ctx.policy()).clone();
            if !show.provenance {
                policy.provenance.clear();
            }
            emit(output, &policy, |policy| summary(policy, ctx))
        }
        PolicyCommand::Override(over) => {
            let value = serde_json::from_str(&over.value)
                .or_else(|_| serde_json::from_str(&format!("\"{}\"", over.value)))
                .with_context(|| format!("Invalid override value '{}'", over.value))?;
            ctx.policy_center()
                .apply_override(&over.path, value)
                .with_context(|| format!("Failed to override {}", over.path))?;
            let mut policy = (*ctx.policy()).clone();
            policy.provenance.retain(|path, _| path == &over.path);
            emit(output, &policy, |policy| summary(policy, ctx))
        }
    }
}

fn summary(policy: &HealPolicy, ctx: &CliContext) -> String {
    let mut lines = vec![format!("Policy Revision: {}", policy.rev)];
    if let Some(path) = ctx.policy_path() {
        lines.push(format!("Policy File: {}", path.display()));
    }
    lines.push(format!(
        "Stages → history={}, heuristics={}, fuzzy={}",
        policy.stages.history, policy.stages.heuristics, policy.stages.fuzzy
    ));
    let disabled = if policy.heuristics.disabled.is_empty() {
        "none".to_string()
    } else {
        policy.heuristics.disabled.join(", ")
    };
    lines.push(format!("Disabled Heuristics → {}", disabled));
    lines.push(format!(
        "Fuzzy → min_score={}, scoring={:?}",
        policy.fuzzy.min_score, policy.fuzzy.scoring
    ));
    lines.push(format!(
        "Logging → level={}, json={}",
        policy.logging.level, policy.logging.json
    ));
    let mut sources: Vec<_> = policy.provenance.values().collect();
    sources.sort_by(|a, b| a.path.cmp(&b.path));
    for entry in sources {
        lines.push(format!("  {} ← {:?}", entry.path, entry.source));
    }
    lines.join("\n")
}
