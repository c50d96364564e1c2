use clap::Subcommand;

use super::classify::ClassifyArgs;
use super::policy::PolicyArgs;
use super::replay::ResolveArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Resolve an element against a recorded DOM snapshot, healing if needed
    Resolve(ResolveArgs),

    /// Classify a failure message into a category
    Classify(ClassifyArgs),

    /// Inspect the effective healing policy
    Policy(PolicyArgs),
}
