//! Replay driver for the self-healing element locator
//!
//! Wires a loaded [`HealPolicy`](selfheal_policy_center::HealPolicy) into a
//! [`SelfHealingResolver`](action_locator::SelfHealingResolver) and exposes it
//! through the `selfheal` command line.

pub mod cli;
pub mod errors;
pub mod wiring;

pub use errors::CliError;
pub use wiring::resolver_from_policy;
