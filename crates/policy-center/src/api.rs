use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::Value;
use tracing::info;

use crate::errors::PolicyError;
use crate::model::{HealPolicy, PolicySource, ScoringMode};

pub trait PolicyCenter: Send + Sync {
    fn snapshot(&self) -> Arc<HealPolicy>;
    fn apply_override(&self, path: &str, value: Value) -> Result<(), PolicyError>;
}

/// Policy holder that swaps whole snapshots; readers never block writers.
pub struct InMemoryPolicyCenter {
    current: ArcSwap<HealPolicy>,
}

impl InMemoryPolicyCenter {
    pub fn new(policy: HealPolicy) -> Self {
        Self {
            current: ArcSwap::from_pointee(policy),
        }
    }
}

impl PolicyCenter for InMemoryPolicyCenter {
    fn snapshot(&self) -> Arc<HealPolicy> {
        self.current.load_full()
    }

    fn apply_override(&self, path: &str, value: Value) -> Result<(), PolicyError> {
        let mut next = HealPolicy::clone(&self.current.load());
        apply_override_to_policy(&mut next, path, &value, PolicySource::RuntimeOverride)?;
        next.rev = next.rev.saturating_add(1);
        info!(path, rev = next.rev, "policy override applied");
        self.current.store(Arc::new(next));
        Ok(())
    }
}

pub(crate) fn apply_override_to_policy(
    policy: &mut HealPolicy,
    path: &str,
    value: &Value,
    source: PolicySource,
) -> Result<(), PolicyError> {
    let changed = match path {
        "stages.history" => merge(&mut policy.stages.history, to_bool(value)?),
        "stages.heuristics" => merge(&mut policy.stages.heuristics, to_bool(value)?),
        "stages.fuzzy" => merge(&mut policy.stages.fuzzy, to_bool(value)?),
        "heuristics.disabled" => merge(&mut policy.heuristics.disabled, to_names(value)?),
        "fuzzy.min_score" => merge(&mut policy.fuzzy.min_score, to_score(value)?),
        "fuzzy.scoring" => merge(&mut policy.fuzzy.scoring, to_scoring(value)?),
        "logging.level" => merge(&mut policy.logging.level, to_string(value)?),
        "logging.json" => merge(&mut policy.logging.json, to_bool(value)?),
        path => return Err(PolicyError::UnsupportedPath(path.to_string())),
    };
    if changed || source == PolicySource::Builtin {
        policy.set_provenance(path, source);
    }
    Ok(())
}

fn merge<T: PartialEq>(target: &mut T, candidate: T) -> bool {
    if *target == candidate {
        return false;
    }
    *target = candidate;
    true
}

fn to_bool(value: &Value) -> Result<bool, PolicyError> {
    value
        .as_bool()
        .ok_or_else(|| PolicyError::InvalidValue(format!("expected bool, got {value}")))
}

fn to_score(value: &Value) -> Result<u8, PolicyError> {
    value
        .as_u64()
        .ok_or_else(|| PolicyError::InvalidValue(format!("expected integer, got {value}")))
        .and_then(|v| {
            if v <= 100 {
                Ok(v as u8)
            } else {
                Err(PolicyError::InvalidValue(format!(
                    "score {v} is outside 0..=100"
                )))
            }
        })
}

fn to_string(value: &Value) -> Result<String, PolicyError> {
    value
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PolicyError::InvalidValue(format!("expected string, got {value}")))
}

fn to_scoring(value: &Value) -> Result<ScoringMode, PolicyError> {
    match to_string(value)?.to_ascii_lowercase().as_str() {
        "shallow" => Ok(ScoringMode::Shallow),
        "subtree" => Ok(ScoringMode::Subtree),
        other => Err(PolicyError::InvalidValue(format!(
            "unknown scoring mode '{other}'"
        ))),
    }
}

/// Accepts a list of names or a comma-separated string.
fn to_names(value: &Value) -> Result<Vec<String>, PolicyError> {
    let names = match value {
        Value::Null => Vec::new(),
        Value::String(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    PolicyError::InvalidValue(format!("expected string, got {item}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        other => {
            return Err(PolicyError::InvalidValue(format!(
                "expected list of names, got {other}"
            )))
        }
    };
    Ok(names)
}
