use clap::Parser;
use std::path::PathBuf;

use super::commands::Commands;
use super::output::OutputFormat;

#[derive(Parser)]
#[command(name = "selfheal", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Healing policy file (YAML)
    #[arg(short, long, value_name = "FILE")]
    pub policy: Option<PathBuf>,

    /// Log level; defaults to the policy's `logging.level`
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long)]
    pub debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}
