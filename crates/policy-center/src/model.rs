use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct HealPolicy {
    pub rev: u64,
    pub stages: StagePolicy,
    pub heuristics: HeuristicPolicy,
    pub fuzzy: FuzzyPolicy,
    pub logging: LoggingPolicy,
    #[serde(default)]
    pub provenance: HashMap<String, PolicyProvenance>,
}

/// Which fallback stages run after the primary lookup
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StagePolicy {
    pub history: bool,
    pub heuristics: bool,
    pub fuzzy: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct HeuristicPolicy {
    /// Heuristic names removed from the default chain
    pub disabled: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FuzzyPolicy {
    pub min_score: u8,
    pub scoring: ScoringMode,
}

/// Text scored for each node during fuzzy matching
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    #[default]
    Shallow,
    Subtree,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LoggingPolicy {
    pub level: String,
    pub json: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyProvenance {
    pub path: String,
    pub source: PolicySource,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PolicySource {
    Builtin,
    File,
    Env,
    Cli,
    RuntimeOverride,
}

impl HealPolicy {
    pub fn set_provenance(&mut self, path: &str, source: PolicySource) {
        self.provenance.insert(
            path.to_string(),
            PolicyProvenance {
                path: path.to_string(),
                source,
            },
        );
    }

    pub fn source_of(&self, path: &str) -> Option<PolicySource> {
        self.provenance.get(path).map(|p| p.source)
    }
}
